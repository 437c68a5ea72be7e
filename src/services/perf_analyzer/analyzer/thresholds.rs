//! Comparison thresholds
//!
//! All three thresholds are percentages applied to the sign-normalized
//! ("effective") diff, where positive always means better.

use serde::{Deserialize, Serialize};

use crate::services::perf_analyzer::models::ComparisonStatus;

pub const DEFAULT_DEGRADATION_THRESHOLD: f64 = 20.0;
pub const DEFAULT_WARNING_THRESHOLD: f64 = 10.0;
pub const DEFAULT_IMPROVEMENT_THRESHOLD: f64 = 10.0;

/// Accepts camelCase (JSON) and snake_case (TOML) keys
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonThresholds {
    #[serde(alias = "degradation_threshold")]
    pub degradation_threshold: f64,
    #[serde(alias = "warning_threshold")]
    pub warning_threshold: f64,
    #[serde(alias = "improvement_threshold")]
    pub improvement_threshold: f64,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            degradation_threshold: DEFAULT_DEGRADATION_THRESHOLD,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            improvement_threshold: DEFAULT_IMPROVEMENT_THRESHOLD,
        }
    }
}

/// Caller-supplied overrides; unset fields keep the base value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThresholdOverrides {
    pub degradation_threshold: Option<f64>,
    pub warning_threshold: Option<f64>,
    pub improvement_threshold: Option<f64>,
}

impl ComparisonThresholds {
    pub fn with_overrides(self, overrides: &ThresholdOverrides) -> Self {
        Self {
            degradation_threshold: overrides
                .degradation_threshold
                .unwrap_or(self.degradation_threshold),
            warning_threshold: overrides.warning_threshold.unwrap_or(self.warning_threshold),
            improvement_threshold: overrides
                .improvement_threshold
                .unwrap_or(self.improvement_threshold),
        }
    }

    /// Thresholds must be finite, non-negative, and warning must not exceed degradation
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("degradation_threshold", self.degradation_threshold),
            ("warning_threshold", self.warning_threshold),
            ("improvement_threshold", self.improvement_threshold),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.warning_threshold > self.degradation_threshold {
            return Err(format!(
                "warning_threshold ({}) must not exceed degradation_threshold ({})",
                self.warning_threshold, self.degradation_threshold
            ));
        }
        Ok(())
    }

    /// Status band for a sign-normalized diff
    pub fn classify(&self, effective_diff_percent: f64) -> ComparisonStatus {
        if effective_diff_percent < -self.degradation_threshold {
            ComparisonStatus::Degradation
        } else if effective_diff_percent < -self.warning_threshold {
            ComparisonStatus::Warning
        } else if effective_diff_percent > self.improvement_threshold {
            ComparisonStatus::Improvement
        } else {
            ComparisonStatus::Stable
        }
    }
}
