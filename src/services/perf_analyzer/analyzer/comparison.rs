//! Baseline comparison engine
//!
//! Walks a fixed catalogue of metrics and classifies each one against the
//! configured thresholds. Diffs are sign-normalized per metric direction so a
//! positive effective diff is always an improvement.

use super::entity::EntityType;
use super::thresholds::ComparisonThresholds;
use crate::services::perf_analyzer::models::{
    AvgMax, BaselineMetrics, ComparisonReport, ComparisonResult, ComparisonStatus,
    ComparisonSummary, EntityTypeMetrics, LatencyStats, MetricCategory,
};

/// Reported diff percent when the baseline is zero and the current value is not
const ZERO_BASELINE_SENTINEL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    LowerIsBetter,
    HigherIsBetter,
}

/// How a row's status is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Classify(MetricDirection),
    /// Volatile value: reported, never classified
    Info,
    /// Classified only when both sides carry enough samples
    Gated {
        direction: MetricDirection,
        baseline_samples: u64,
        current_samples: u64,
        required: u64,
    },
}

/// `(current - baseline) / baseline * 100`, guarded for a zero baseline
pub fn diff_percent(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        if current == 0.0 { 0.0 } else { ZERO_BASELINE_SENTINEL }
    } else {
        (current - baseline) / baseline * 100.0
    }
}

/// Diff percent with the sign flipped for lower-is-better metrics
pub fn effective_diff_percent(diff_percent: f64, direction: MetricDirection) -> f64 {
    match direction {
        MetricDirection::LowerIsBetter => -diff_percent,
        MetricDirection::HigherIsBetter => diff_percent,
    }
}

// ============================================================================
// Row collection
// ============================================================================

struct Collector<'a> {
    thresholds: &'a ComparisonThresholds,
    category: MetricCategory,
    results: Vec<ComparisonResult>,
}

impl Collector<'_> {
    fn section(&mut self, category: MetricCategory) -> &mut Self {
        self.category = category;
        self
    }

    fn push(
        &mut self,
        metric: impl Into<String>,
        baseline: f64,
        current: f64,
        rule: Rule,
    ) -> &mut Self {
        self.push_row(metric.into(), baseline, current, rule, false)
    }

    fn push_count(
        &mut self,
        metric: impl Into<String>,
        baseline: u64,
        current: u64,
        direction: MetricDirection,
    ) -> &mut Self {
        let rule = Rule::Classify(direction);
        self.push_row(metric.into(), baseline as f64, current as f64, rule, true)
    }

    fn push_row(
        &mut self,
        metric: String,
        baseline: f64,
        current: f64,
        rule: Rule,
        integer_valued: bool,
    ) -> &mut Self {
        let diff_percent = diff_percent(baseline, current);
        let status = match rule {
            Rule::Info => ComparisonStatus::Info,
            Rule::Classify(direction) => {
                self.thresholds.classify(effective_diff_percent(diff_percent, direction))
            },
            Rule::Gated { direction, baseline_samples, current_samples, required } => {
                if baseline_samples < required || current_samples < required {
                    ComparisonStatus::Insufficient
                } else {
                    self.thresholds.classify(effective_diff_percent(diff_percent, direction))
                }
            },
        };

        self.results.push(ComparisonResult {
            metric,
            category: self.category,
            baseline,
            current,
            diff: current - baseline,
            diff_percent,
            status,
            integer_valued,
        });
        self
    }

    /// Avg/P50/P95 classified lower-is-better, P99/Max informational
    fn latency(
        &mut self,
        label: &str,
        baseline: &LatencyStats,
        current: &LatencyStats,
    ) -> &mut Self {
        let lower = Rule::Classify(MetricDirection::LowerIsBetter);
        self.push(format!("{} Avg (ms)", label), baseline.avg, current.avg, lower)
            .push(format!("{} P50 (ms)", label), baseline.p50, current.p50, lower)
            .push(format!("{} P95 (ms)", label), baseline.p95, current.p95, lower)
            .push(format!("{} P99 (ms)", label), baseline.p99, current.p99, Rule::Info)
            .push(format!("{} Max (ms)", label), baseline.max, current.max, Rule::Info)
    }

    fn avg_max(
        &mut self,
        label: &str,
        baseline: &AvgMax,
        current: &AvgMax,
        direction: MetricDirection,
    ) -> &mut Self {
        self.push(format!("{} Avg", label), baseline.avg, current.avg, Rule::Classify(direction))
            .push(format!("{} Max", label), baseline.max, current.max, Rule::Classify(direction))
    }

    fn entity(
        &mut self,
        entity: EntityType,
        baseline: &EntityTypeMetrics,
        current: &EntityTypeMetrics,
    ) -> &mut Self {
        let required = entity.min_comparison_samples();
        let (bs, cs) = (&baseline.sample_counts, &current.sample_counts);
        let series = [
            ("Search", &baseline.search_latency, &current.search_latency, bs.search, cs.search),
            ("Intake", &baseline.intake_latency, &current.intake_latency, bs.intake, cs.intake),
            (
                "Processing",
                &baseline.processing_latency,
                &current.processing_latency,
                bs.processing,
                cs.processing,
            ),
        ];

        for (label, b, c, baseline_samples, current_samples) in series {
            let rule = Rule::Gated {
                direction: MetricDirection::LowerIsBetter,
                baseline_samples,
                current_samples,
                required,
            };
            self.push(format!("{} Latency Avg (ms)", label), b.avg, c.avg, rule)
                .push(format!("{} Latency P95 (ms)", label), b.p95, c.p95, rule);
        }

        let higher = MetricDirection::HigherIsBetter;
        let (b, c) = (baseline, current);
        self.push_count("Documents Processed", b.documents_processed, c.documents_processed, higher)
            .push_count("Documents Indexed", b.documents_indexed, c.documents_indexed, higher)
            .push_count("Pages Processed", b.pages_processed, c.pages_processed, higher)
            .push_count("Trigger Count", b.trigger_count, c.trigger_count, higher)
    }
}

// ============================================================================
// Comparison Engine
// ============================================================================

pub struct ComparisonEngine {
    thresholds: ComparisonThresholds,
}

impl ComparisonEngine {
    pub fn new(thresholds: ComparisonThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ComparisonThresholds {
        &self.thresholds
    }

    /// Compare `current` against `baseline`
    ///
    /// Results come out grouped by category in report order.
    pub fn compare(
        &self,
        baseline: &BaselineMetrics,
        current: &BaselineMetrics,
    ) -> ComparisonReport {
        use MetricCategory as C;
        use MetricDirection::{HigherIsBetter, LowerIsBetter};

        let (b, c) = (&baseline.metrics, &current.metrics);
        let mut rows = Collector {
            thresholds: &self.thresholds,
            category: C::SearchLatency,
            results: Vec::new(),
        };

        rows.section(C::SearchLatency).latency(
            "Search Latency",
            &b.search_latency,
            &c.search_latency,
        );
        rows.section(C::IntakeLatency).latency(
            "Intake Latency",
            &b.intake_latency,
            &c.intake_latency,
        );
        rows.section(C::ProcessingLatency).latency(
            "Processing Latency",
            &b.processing_latency,
            &c.processing_latency,
        );

        let lower = Rule::Classify(LowerIsBetter);
        let higher = Rule::Classify(HigherIsBetter);

        rows.section(C::Cpu)
            .push("CPU Avg (%)", b.cpu.avg, c.cpu.avg, lower)
            .push("CPU P95 (%)", b.cpu.p95, c.cpu.p95, lower)
            .push("CPU Max (%)", b.cpu.max, c.cpu.max, lower);

        let (bm, cm) = (&b.memory, &c.memory);
        rows.section(C::Memory)
            .push("Heap Avg (%)", bm.avg_heap_percent, cm.avg_heap_percent, lower)
            .push("Heap Max (%)", bm.max_heap_percent, cm.max_heap_percent, lower)
            .push("Heap Used Avg (MB)", bm.avg_heap_used_mb, cm.avg_heap_used_mb, lower)
            .push("Heap Used Max (MB)", bm.max_heap_used_mb, cm.max_heap_used_mb, lower);

        rows.section(C::Throughput)
            .push(
                "Avg Documents/sec",
                b.throughput.avg_documents_per_second,
                c.throughput.avg_documents_per_second,
                higher,
            )
            .push(
                "Peak Documents/sec",
                b.throughput.peak_documents_per_second,
                c.throughput.peak_documents_per_second,
                higher,
            );

        rows.section(C::IndexEfficiency)
            .push(
                "Index Efficiency Ratio",
                b.index_efficiency.ratio,
                c.index_efficiency.ratio,
                higher,
            )
            .push_count(
                "Total Documents Indexed",
                b.index_efficiency.total_documents_indexed,
                c.index_efficiency.total_documents_indexed,
                HigherIsBetter,
            )
            .push_count(
                "Total Documents Processed",
                b.index_efficiency.total_documents_processed,
                c.index_efficiency.total_documents_processed,
                HigherIsBetter,
            );

        rows.section(C::Counters)
            .push_count(
                "Pages Processed",
                b.pages_processed.total,
                c.pages_processed.total,
                HigherIsBetter,
            )
            .push_count(
                "Trigger Count",
                b.trigger_count.total,
                c.trigger_count.total,
                HigherIsBetter,
            );

        let (be, ce) = (&b.exponential_averages, &c.exponential_averages);
        rows.section(C::ExponentialAverages)
            .avg_max(
                "Checkpoint Duration (ms)",
                &be.checkpoint_duration_ms,
                &ce.checkpoint_duration_ms,
                LowerIsBetter,
            )
            .avg_max(
                "Documents Indexed",
                &be.documents_indexed,
                &ce.documents_indexed,
                HigherIsBetter,
            )
            .avg_max(
                "Documents Processed",
                &be.documents_processed,
                &ce.documents_processed,
                HigherIsBetter,
            );

        rows.section(C::TransformStates)
            .push_count(
                "Failed Samples",
                b.transform_states.failed_samples,
                c.transform_states.failed_samples,
                LowerIsBetter,
            )
            .push_count(
                "Unhealthy Samples",
                b.transform_states.unhealthy_samples,
                c.transform_states.unhealthy_samples,
                LowerIsBetter,
            );

        for entity in EntityType::ALL {
            let (be, ce) = (b.per_entity_type.get(entity), c.per_entity_type.get(entity));
            if be.sample_counts.total == 0 && ce.sample_counts.total == 0 {
                continue;
            }
            rows.section(C::Entity(entity)).entity(entity, be, ce);
        }

        let (ber, cer) = (&b.errors, &c.errors);
        rows.section(C::Errors)
            .push_count("Search Failures", ber.search_failures, cer.search_failures, LowerIsBetter)
            .push_count("Index Failures", ber.index_failures, cer.index_failures, LowerIsBetter)
            .push_count("Total Failures", ber.total_failures, cer.total_failures, LowerIsBetter);

        let mut summary = ComparisonSummary::default();
        for result in &rows.results {
            summary.record(result.status);
        }

        tracing::info!(
            "Compared {} metrics: {} improvements, {} degradations, {} warnings, {} stable, \
             {} insufficient",
            rows.results.len(),
            summary.improvements,
            summary.degradations,
            summary.warnings,
            summary.stable,
            summary.insufficient
        );

        ComparisonReport {
            baseline_name: baseline.test_name.clone(),
            current_name: current.test_name.clone(),
            results: rows.results,
            summary,
        }
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new(ComparisonThresholds::default())
    }
}
