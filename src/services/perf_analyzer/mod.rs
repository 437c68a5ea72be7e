//! Transform Performance Analyzer
//!
//! Extracts a performance baseline from the logs of one load-test run and
//! compares two baselines for regressions.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │              extract_baseline / compare_baselines          │
//! │                             │                              │
//! │           ┌─────────────────┼─────────────────┐            │
//! │           ▼                 ▼                 ▼            │
//! │  ┌───────────────┐  ┌───────────────┐  ┌─────────────┐     │
//! │  │    Parser     │  │   Analyzer    │  │   Models    │     │
//! │  │  LogFileSet   │  │  Interval     │  │  Baseline   │     │
//! │  │  LogComposer  │  │  Incremental  │  │  Metrics    │     │
//! │  │  LineParser   │  │  Baseline     │  │  Comparison │     │
//! │  │  RecordParser │  │  Store        │  │  Report     │     │
//! │  │               │  │  Comparison   │  │             │     │
//! │  │               │  │  Report       │  │             │     │
//! │  └───────────────┘  └───────────────┘  └─────────────┘     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use transform_perf::services::perf_analyzer::{compare_baselines, extract_baseline};
//!
//! let current = extract_baseline(Path::new("logs"), "run-42", "run-42", TestConfig::default())?;
//! let report = compare_baselines(&saved, &current, &ThresholdOverrides::default());
//! println!("{}", ReportFormatter::format(&report));
//! ```

pub mod analyzer;
pub mod models;
pub mod parser;

#[cfg(test)]
mod tests;

pub use analyzer::{
    BaselineBuilder, BaselineStore, ComparisonEngine, ComparisonThresholds, ReportFormatter,
    StoreError, ThresholdOverrides,
};
pub use models::*;
pub use parser::{LogComposer, LogFileSet, ParseError, ParseResult};

use std::path::Path;

/// Build a baseline from the three logs in `logs_dir` whose names start with `prefix`
///
/// Fails only when a log file is missing or unreadable; malformed lines are
/// skipped. Nothing is written to disk.
pub fn extract_baseline(
    logs_dir: &Path,
    prefix: &str,
    test_name: &str,
    test_config: TestConfig,
) -> ParseResult<BaselineMetrics> {
    let files = LogFileSet::locate(logs_dir, prefix)?;
    tracing::info!(
        "Extracting baseline '{}' from {}, {}, {}",
        test_name,
        files.cluster_health.display(),
        files.node_stats.display(),
        files.transform_stats.display()
    );

    let logs = LogComposer::new().parse(&files)?;
    Ok(BaselineBuilder::new(test_name, test_config).build(&logs))
}

/// Compare `current` against `baseline`; unset overrides fall back to 20/10/10
pub fn compare_baselines(
    baseline: &BaselineMetrics,
    current: &BaselineMetrics,
    overrides: &ThresholdOverrides,
) -> ComparisonReport {
    let thresholds = ComparisonThresholds::default().with_overrides(overrides);
    ComparisonEngine::new(thresholds).compare(baseline, current)
}
