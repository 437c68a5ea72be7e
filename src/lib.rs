//! Transform Performance Library
//!
//! Baseline extraction from load-test logs and regression comparison
//! between baselines.

pub mod config;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::perf_analyzer::{
    BaselineMetrics, BaselineStore, ComparisonEngine, ComparisonReport, ReportFormatter,
    compare_baselines, extract_baseline,
};
