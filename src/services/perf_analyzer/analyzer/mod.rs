//! Baseline analyzer
//!
//! Turns parsed samples into a baseline and compares baselines.

pub mod baseline;
pub mod baseline_store;
pub mod comparison;
pub mod entity;
pub mod incremental;
pub mod interval;
pub mod report;
pub mod stats;
pub mod thresholds;

pub use baseline::BaselineBuilder;
pub use baseline_store::{BaselineStore, StoreError, StoreResult};
pub use comparison::{ComparisonEngine, MetricDirection};
pub use entity::{EntityClassifier, EntityType};
pub use incremental::{IncrementalMetricCalculator, IncrementalSample, TransformCounterState};
pub use interval::{AdaptiveThresholds, SamplingInterval, SamplingIntervalDetector};
pub use report::ReportFormatter;
pub use thresholds::{ComparisonThresholds, ThresholdOverrides};
