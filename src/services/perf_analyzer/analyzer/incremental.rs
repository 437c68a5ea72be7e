//! Incremental metrics from cumulative transform counters
//!
//! Transform stats report totals since start, so per-interval latency is
//! reconstructed from the delta between two consecutive samples of the same
//! transform. A delta covering too few operations is noise and is dropped; a
//! negative time delta means the counters were reset and is dropped too.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::interval::AdaptiveThresholds;
use crate::services::perf_analyzer::parser::core::TransformSample;

/// Last cumulative values seen for one transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformCounterState {
    pub search_time_ms: f64,
    pub search_count: f64,
    pub index_time_ms: f64,
    pub index_count: f64,
    pub processing_time_ms: f64,
    pub processing_count: f64,
    pub documents_processed: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&TransformSample> for TransformCounterState {
    fn from(sample: &TransformSample) -> Self {
        Self {
            search_time_ms: sample.search_time_ms,
            search_count: sample.search_count,
            index_time_ms: sample.index_time_ms,
            index_count: sample.index_count,
            processing_time_ms: sample.processing_time_ms,
            processing_count: sample.processing_count,
            documents_processed: sample.documents_processed,
            timestamp: sample.timestamp,
        }
    }
}

/// Per-interval values derived from one sample and its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncrementalSample {
    /// ms per search over the interval
    pub search_latency: Option<f64>,
    /// ms per index (intake) operation over the interval
    pub intake_latency: Option<f64>,
    pub processing_latency: Option<f64>,
    /// documents processed per second over the interval
    pub documents_rate: Option<f64>,
}

/// Tracks per-transform counter state for one parse pass
///
/// Owned by a single extraction; never shared between runs.
#[derive(Debug)]
pub struct IncrementalMetricCalculator {
    thresholds: AdaptiveThresholds,
    states: HashMap<String, TransformCounterState>,
}

impl IncrementalMetricCalculator {
    pub fn new(thresholds: AdaptiveThresholds) -> Self {
        Self { thresholds, states: HashMap::new() }
    }

    /// Feed the next sample in chronological order
    ///
    /// Returns `None` for the first sample of a transform, which only seeds
    /// state. Stored state is always replaced by the current sample, whether
    /// or not a delta passed its threshold.
    pub fn observe(&mut self, sample: &TransformSample) -> Option<IncrementalSample> {
        let current = TransformCounterState::from(sample);
        let previous = self.states.insert(sample.transform_id.clone(), current)?;

        Some(IncrementalSample {
            search_latency: Self::latency(
                current.search_time_ms - previous.search_time_ms,
                current.search_count - previous.search_count,
                self.thresholds.min_search_count,
            ),
            intake_latency: Self::latency(
                current.index_time_ms - previous.index_time_ms,
                current.index_count - previous.index_count,
                self.thresholds.min_index_count,
            ),
            processing_latency: Self::latency(
                current.processing_time_ms - previous.processing_time_ms,
                current.processing_count - previous.processing_count,
                self.thresholds.min_processing_count,
            ),
            documents_rate: Self::rate(&previous, &current),
        })
    }

    fn latency(delta_time: f64, delta_count: f64, min_count: u64) -> Option<f64> {
        (delta_count >= min_count as f64 && delta_time >= 0.0).then(|| delta_time / delta_count)
    }

    fn rate(previous: &TransformCounterState, current: &TransformCounterState) -> Option<f64> {
        let seconds = (current.timestamp - previous.timestamp).num_milliseconds() as f64 / 1000.0;
        let docs = current.documents_processed - previous.documents_processed;
        (seconds > 0.0 && docs >= 0.0).then(|| docs / seconds)
    }

    pub fn state(&self, transform_id: &str) -> Option<&TransformCounterState> {
        self.states.get(transform_id)
    }

    pub fn tracked_transforms(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn sample(id: &str, secs: i64, search_time: f64, search_count: f64) -> TransformSample {
        TransformSample {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
                + Duration::seconds(secs),
            transform_id: id.to_string(),
            search_time_ms: search_time,
            search_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_sample_seeds_state() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        assert!(calc.observe(&sample("t-host", 0, 100.0, 10.0)).is_none());
        assert_eq!(calc.state("t-host").map(|s| s.search_count), Some(10.0));
    }

    #[test]
    fn test_delta_latency() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 100.0, 10.0));
        let inc = calc.observe(&sample("t-host", 5, 400.0, 40.0)).unwrap();
        assert_eq!(inc.search_latency, Some(10.0));
        // No index or processing activity
        assert_eq!(inc.intake_latency, None);
        assert_eq!(inc.processing_latency, None);
    }

    #[test]
    fn test_small_delta_is_dropped_but_state_advances() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 0.0, 0.0));
        // 2 searches < threshold of 5, even with a huge time spike
        let inc = calc.observe(&sample("t-host", 5, 90_000.0, 2.0)).unwrap();
        assert_eq!(inc.search_latency, None);

        // Next delta is computed against the dropped sample, not the seed
        let inc = calc.observe(&sample("t-host", 10, 90_060.0, 8.0)).unwrap();
        assert_eq!(inc.search_latency, Some(10.0));
    }

    #[test]
    fn test_delta_exactly_at_threshold_is_kept() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 0.0, 0.0));
        let inc = calc.observe(&sample("t-host", 5, 50.0, 5.0)).unwrap();
        assert_eq!(inc.search_latency, Some(10.0));

        let inc = calc.observe(&sample("t-host", 10, 90.0, 9.0)).unwrap();
        assert_eq!(inc.search_latency, None);
    }

    #[test]
    fn test_zero_time_delta_is_kept() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 100.0, 0.0));
        let inc = calc.observe(&sample("t-host", 5, 100.0, 5.0)).unwrap();
        assert_eq!(inc.search_latency, Some(0.0));
    }

    #[test]
    fn test_counter_reset_is_dropped() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 5_000.0, 10.0));
        let inc = calc.observe(&sample("t-host", 5, 100.0, 20.0)).unwrap();
        assert_eq!(inc.search_latency, None);
    }

    #[test]
    fn test_transforms_tracked_independently() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        calc.observe(&sample("t-host", 0, 0.0, 0.0));
        assert!(calc.observe(&sample("t-user", 0, 0.0, 0.0)).is_none());
        let inc = calc.observe(&sample("t-host", 5, 50.0, 10.0)).unwrap();
        assert_eq!(inc.search_latency, Some(5.0));
        assert_eq!(calc.tracked_transforms(), 2);
    }

    #[test]
    fn test_documents_rate() {
        let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
        let mut first = sample("t-host", 0, 0.0, 0.0);
        first.documents_processed = 1_000.0;
        let mut second = sample("t-host", 4, 0.0, 0.0);
        second.documents_processed = 3_000.0;

        calc.observe(&first);
        assert_eq!(calc.observe(&second).unwrap().documents_rate, Some(500.0));
    }

    proptest! {
        #[test]
        fn prop_emitted_never_exceeds_samples_minus_one(
            steps in prop::collection::vec((0.0f64..500.0, 0.0f64..20.0), 1..60)
        ) {
            let mut calc = IncrementalMetricCalculator::new(AdaptiveThresholds::default());
            let (mut time, mut count) = (0.0, 0.0);
            let mut emitted = 0usize;

            for (i, (dt, dc)) in steps.iter().enumerate() {
                time += dt;
                count += dc.floor();
                let before = calc.state("t").map(|s| s.search_count).unwrap_or(0.0);
                if let Some(inc) = calc.observe(&sample("t", i as i64, time, count)) {
                    if let Some(latency) = inc.search_latency {
                        emitted += 1;
                        prop_assert!(count - before >= 5.0);
                        prop_assert!(latency >= 0.0);
                    }
                }
            }
            prop_assert!(emitted <= steps.len() - 1);
        }
    }
}
