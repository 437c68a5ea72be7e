//! Sampling interval detection and adaptive noise thresholds
//!
//! Transform stats are logged in batches: several transforms are written back
//! to back within one sampling tick. The effective interval is the median gap
//! between batches, and the minimum operation count an incremental sample must
//! cover scales with it, so the signal-to-noise ratio stays the same however
//! densely a test was sampled.

use chrono::{DateTime, Utc};

use super::stats;
use crate::services::perf_analyzer::models::SamplingSummary;

/// Timestamps closer than this to the batch start belong to the same batch
pub const BATCH_TOLERANCE_MS: i64 = 100;
/// Batch gaps at or above this are clock jumps or stalls, not cadence
pub const MAX_BATCH_GAP_MS: i64 = 60_000;
/// Interval assumed when the log holds fewer than two batches
pub const DEFAULT_INTERVAL_MS: f64 = 5_000.0;

/// Minimum incremental counts at the reference 5s cadence
const BASE_MIN_SEARCH_COUNT: f64 = 5.0;
const BASE_MIN_INDEX_COUNT: f64 = 10.0;
const BASE_MIN_PROCESSING_COUNT: f64 = 5.0;

/// Detected sampling cadence of one transform log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingInterval {
    pub interval_ms: f64,
    pub batch_count: usize,
}

pub struct SamplingIntervalDetector;

impl SamplingIntervalDetector {
    /// Detect the interval from transform-log timestamps in file order
    pub fn detect(timestamps: &[DateTime<Utc>]) -> SamplingInterval {
        let batches = Self::batch_starts(timestamps);

        let gaps: Vec<f64> = batches
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds())
            .filter(|gap| *gap > 0 && *gap < MAX_BATCH_GAP_MS)
            .map(|gap| gap as f64)
            .collect();

        let interval_ms = if batches.len() < 2 || gaps.is_empty() {
            tracing::warn!(
                "Only {} sampling batches with {} usable gaps, assuming {}ms interval",
                batches.len(),
                gaps.len(),
                DEFAULT_INTERVAL_MS
            );
            DEFAULT_INTERVAL_MS
        } else {
            stats::median(&gaps)
        };

        tracing::debug!(
            "Detected sampling interval {:.0}ms over {} batches",
            interval_ms,
            batches.len()
        );
        SamplingInterval { interval_ms, batch_count: batches.len() }
    }

    /// Start timestamp of each batch
    ///
    /// A timestamp opens a new batch only when it is more than the tolerance
    /// away from the current batch's start.
    fn batch_starts(timestamps: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
        let mut starts: Vec<DateTime<Utc>> = Vec::new();
        for ts in timestamps {
            match starts.last() {
                Some(last) if (*ts - *last).num_milliseconds().abs() <= BATCH_TOLERANCE_MS => {},
                _ => starts.push(*ts),
            }
        }
        starts
    }
}

/// Minimum delta counts an incremental latency sample must cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveThresholds {
    pub min_search_count: u64,
    pub min_index_count: u64,
    pub min_processing_count: u64,
}

impl AdaptiveThresholds {
    /// `max(1, floor(base * interval / 5000))` for each series
    pub fn from_interval(interval_ms: f64) -> Self {
        let scale = |base: f64| ((base * interval_ms / DEFAULT_INTERVAL_MS).floor() as u64).max(1);
        Self {
            min_search_count: scale(BASE_MIN_SEARCH_COUNT),
            min_index_count: scale(BASE_MIN_INDEX_COUNT),
            min_processing_count: scale(BASE_MIN_PROCESSING_COUNT),
        }
    }

    pub fn summary(&self, interval: &SamplingInterval) -> SamplingSummary {
        SamplingSummary {
            interval_ms: interval.interval_ms,
            batch_count: interval.batch_count as u64,
            min_search_count: self.min_search_count,
            min_index_count: self.min_index_count,
            min_processing_count: self.min_processing_count,
        }
    }
}

impl Default for AdaptiveThresholds {
    fn default() -> Self {
        Self::from_interval(DEFAULT_INTERVAL_MS)
    }
}
