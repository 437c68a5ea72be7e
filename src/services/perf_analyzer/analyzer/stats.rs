//! Statistics over finite numeric series
//!
//! Every function returns 0 for an empty series so callers can fill model
//! leaves without checking.

use crate::services::perf_analyzer::models::{AvgMax, LatencyStats};

/// Nearest-rank percentile of an ascending series
///
/// `index = ceil(p/100 * n) - 1`, clamped to `[0, n-1]`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let n = sorted.len();
    let rank = (p / 100.0 * n as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, n as i64 - 1) as usize;
    sorted[idx]
}

pub fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Ascending copy with non-finite values dropped
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Median of a series (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

impl LatencyStats {
    pub fn from_values(values: &[f64]) -> Self {
        let sorted = sorted(values);
        Self {
            avg: avg(&sorted),
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            max: max(&sorted),
        }
    }
}

impl AvgMax {
    pub fn from_values(values: &[f64]) -> Self {
        Self { avg: avg(values), max: max(values) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_nearest_rank() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 95.0), 10.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn test_empty_series_are_zero() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(avg(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
        assert_eq!(min(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(LatencyStats::from_values(&[]), LatencyStats::default());
        assert_eq!(AvgMax::from_values(&[]), AvgMax::default());
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_latency_stats_unsorted_input() {
        let stats = LatencyStats::from_values(&[30.0, 10.0, 20.0, 40.0]);
        assert_eq!(stats.avg, 25.0);
        assert_eq!(stats.p50, 20.0);
        assert_eq!(stats.p95, 40.0);
        assert_eq!(stats.max, 40.0);
    }

    proptest! {
        #[test]
        fn prop_percentile_bounds(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200)) {
            let sorted = sorted(&values);
            prop_assert_eq!(percentile(&sorted, 100.0), max(&values));
            prop_assert_eq!(percentile(&sorted, 0.0), sorted[0]);
            prop_assert_eq!(percentile(&sorted, 0.0), min(&values));
        }

        #[test]
        fn prop_percentiles_are_monotonic(values in prop::collection::vec(0.0f64..1.0e4, 1..100)) {
            let stats = LatencyStats::from_values(&values);
            prop_assert!(stats.p50 <= stats.p95);
            prop_assert!(stats.p95 <= stats.p99);
            prop_assert!(stats.p99 <= stats.max);
        }
    }
}
