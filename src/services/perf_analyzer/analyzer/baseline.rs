//! Baseline builder
//!
//! Assembles parsed log samples into one [`BaselineMetrics`] record.
//!
//! Key rules:
//! - Latency series come from incremental deltas, never from cumulative values
//! - Cumulative counters (documents, pages, triggers, failures) are totalled by
//!   their maximum observed value; summing samples would count the same
//!   documents once per sample
//! - Empty series resolve to zero so every leaf is a number

use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};

use super::entity::{EntityClassifier, EntityType};
use super::incremental::{IncrementalMetricCalculator, IncrementalSample};
use super::interval::{AdaptiveThresholds, SamplingIntervalDetector};
use super::stats;
use crate::services::perf_analyzer::models::{
    AvgMax, BaselineMetrics, ClusterHealthMetrics, CounterTotal, CpuMetrics, EntityTypeMetrics,
    ErrorMetrics, ExponentialAverages, IndexEfficiency, LatencyStats, MemoryMetrics, Metrics,
    PerEntityTypeMetrics, SampleCounts, TestConfig, ThroughputMetrics, TransformStateMetrics,
};
use crate::services::perf_analyzer::parser::ParsedLogs;
use crate::services::perf_analyzer::parser::core::{HealthSample, NodeReading, TransformSample};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ============================================================================
// Accumulators
// ============================================================================

#[derive(Debug, Default)]
struct LatencySeries {
    search: Vec<f64>,
    intake: Vec<f64>,
    processing: Vec<f64>,
}

impl LatencySeries {
    fn push(&mut self, inc: &IncrementalSample) {
        self.search.extend(inc.search_latency);
        self.intake.extend(inc.intake_latency);
        self.processing.extend(inc.processing_latency);
    }
}

/// Running maximum of a cumulative counter
#[derive(Debug, Default, Clone, Copy)]
struct CumulativeMax(f64);

impl CumulativeMax {
    fn observe(&mut self, value: f64) {
        if value > self.0 {
            self.0 = value;
        }
    }

    fn total(&self) -> u64 {
        self.0.max(0.0).round() as u64
    }
}

#[derive(Debug, Default)]
struct EntityAccumulator {
    latency: LatencySeries,
    documents_processed: CumulativeMax,
    documents_indexed: CumulativeMax,
    pages_processed: CumulativeMax,
    trigger_count: CumulativeMax,
    samples: u64,
}

impl EntityAccumulator {
    fn observe(&mut self, sample: &TransformSample, inc: Option<&IncrementalSample>) {
        self.samples += 1;
        self.documents_processed.observe(sample.documents_processed);
        self.documents_indexed.observe(sample.documents_indexed);
        self.pages_processed.observe(sample.pages_processed);
        self.trigger_count.observe(sample.trigger_count);
        if let Some(inc) = inc {
            self.latency.push(inc);
        }
    }

    fn finish(&self) -> EntityTypeMetrics {
        EntityTypeMetrics {
            search_latency: LatencyStats::from_values(&self.latency.search),
            intake_latency: LatencyStats::from_values(&self.latency.intake),
            processing_latency: LatencyStats::from_values(&self.latency.processing),
            documents_processed: self.documents_processed.total(),
            documents_indexed: self.documents_indexed.total(),
            pages_processed: self.pages_processed.total(),
            trigger_count: self.trigger_count.total(),
            sample_counts: SampleCounts {
                total: self.samples,
                search: self.latency.search.len() as u64,
                intake: self.latency.intake.len() as u64,
                processing: self.latency.processing.len() as u64,
            },
        }
    }
}

#[derive(Debug, Default)]
struct FailureMax {
    search: CumulativeMax,
    index: CumulativeMax,
}

// ============================================================================
// Baseline Builder
// ============================================================================

/// Builds a baseline from one run's parsed logs
pub struct BaselineBuilder {
    test_name: String,
    test_config: TestConfig,
    timestamp: Option<String>,
    classifier: EntityClassifier,
}

impl BaselineBuilder {
    pub fn new(test_name: impl Into<String>, test_config: TestConfig) -> Self {
        Self {
            test_name: test_name.into(),
            test_config,
            timestamp: None,
            classifier: EntityClassifier::new(),
        }
    }

    /// Fix the record timestamp instead of using the current time
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn build(&self, logs: &ParsedLogs) -> BaselineMetrics {
        let interval = SamplingIntervalDetector::detect(&logs.transform_timestamps());
        let thresholds = AdaptiveThresholds::from_interval(interval.interval_ms);
        tracing::info!(
            "Sampling interval {:.0}ms, minimum counts search={} index={} processing={}",
            interval.interval_ms,
            thresholds.min_search_count,
            thresholds.min_index_count,
            thresholds.min_processing_count
        );

        let mut metrics = self.transform_metrics(&logs.transforms, thresholds);
        Self::fill_throughput(&mut metrics, logs);
        (metrics.cpu, metrics.memory) = Self::resource_metrics(&logs.nodes);
        metrics.cluster_health = Self::cluster_health(&logs.health);

        BaselineMetrics {
            test_name: self.test_name.clone(),
            timestamp: self
                .timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            test_config: self.test_config.clone(),
            metrics,
            sampling: Some(thresholds.summary(&interval)),
        }
    }

    /// Latency, counter, state, error, and exponential-average metrics
    fn transform_metrics(
        &self,
        samples: &[TransformSample],
        thresholds: AdaptiveThresholds,
    ) -> Metrics {
        let mut calculator = IncrementalMetricCalculator::new(thresholds);
        let mut global = LatencySeries::default();
        let mut entities: HashMap<EntityType, EntityAccumulator> = HashMap::new();
        let mut failures: HashMap<&str, FailureMax> = HashMap::new();
        let mut state_counts: BTreeMap<String, u64> = BTreeMap::new();
        let (mut failed_samples, mut unhealthy_samples) = (0u64, 0u64);
        let mut exp_checkpoint = Vec::new();
        let mut exp_indexed = Vec::new();
        let mut exp_processed = Vec::new();
        let mut document_rates = Vec::new();

        for sample in samples {
            let inc = calculator.observe(sample);
            if let Some(inc) = &inc {
                global.push(inc);
                document_rates.extend(inc.documents_rate);
            }

            if let Some(entity) = self.classifier.classify(&sample.transform_id) {
                entities.entry(entity).or_default().observe(sample, inc.as_ref());
            }

            let failure = failures.entry(sample.transform_id.as_str()).or_default();
            failure.search.observe(sample.search_failures);
            failure.index.observe(sample.index_failures);

            if let Some(state) = &sample.state {
                *state_counts.entry(state.to_lowercase()).or_default() += 1;
                if state.eq_ignore_ascii_case("failed") {
                    failed_samples += 1;
                }
            }
            if let Some(health) = &sample.health
                && !health.eq_ignore_ascii_case("green")
            {
                unhealthy_samples += 1;
            }

            exp_checkpoint.extend(sample.exp_avg_checkpoint_duration_ms);
            exp_indexed.extend(sample.exp_avg_documents_indexed);
            exp_processed.extend(sample.exp_avg_documents_processed);
        }

        let mut per_entity_type = PerEntityTypeMetrics::default();
        for (entity, acc) in &entities {
            *per_entity_type.get_mut(*entity) = acc.finish();
        }

        let search_failures: u64 = failures.values().map(|f| f.search.total()).sum();
        let index_failures: u64 = failures.values().map(|f| f.index.total()).sum();

        let documents_processed = Self::entity_sum(&per_entity_type, |m| m.documents_processed);
        let documents_indexed = Self::entity_sum(&per_entity_type, |m| m.documents_indexed);

        Metrics {
            search_latency: LatencyStats::from_values(&global.search),
            intake_latency: LatencyStats::from_values(&global.intake),
            processing_latency: LatencyStats::from_values(&global.processing),
            throughput: ThroughputMetrics {
                total_documents_processed: documents_processed,
                peak_documents_per_second: stats::max(&document_rates),
                ..Default::default()
            },
            index_efficiency: IndexEfficiency {
                ratio: if documents_processed > 0 {
                    documents_indexed as f64 / documents_processed as f64
                } else {
                    0.0
                },
                total_documents_indexed: documents_indexed,
                total_documents_processed: documents_processed,
            },
            pages_processed: CounterTotal {
                total: Self::entity_sum(&per_entity_type, |m| m.pages_processed),
            },
            trigger_count: CounterTotal {
                total: Self::entity_sum(&per_entity_type, |m| m.trigger_count),
            },
            exponential_averages: ExponentialAverages {
                checkpoint_duration_ms: AvgMax::from_values(&exp_checkpoint),
                documents_indexed: AvgMax::from_values(&exp_indexed),
                documents_processed: AvgMax::from_values(&exp_processed),
            },
            per_entity_type,
            transform_states: TransformStateMetrics {
                state_counts,
                failed_samples,
                unhealthy_samples,
            },
            errors: ErrorMetrics {
                search_failures,
                index_failures,
                total_failures: search_failures + index_failures,
            },
            ..Default::default()
        }
    }

    fn entity_sum(
        per_entity: &PerEntityTypeMetrics,
        field: impl Fn(&EntityTypeMetrics) -> u64,
    ) -> u64 {
        EntityType::ALL.iter().map(|e| field(per_entity.get(*e))).sum()
    }

    /// Average and peak documents per second
    ///
    /// The average divides the summed per-entity document maxima by the span
    /// of the transform log. The peak is the fastest single-transform interval,
    /// or the average when no interval produced a rate.
    fn fill_throughput(metrics: &mut Metrics, logs: &ParsedLogs) {
        let throughput = &mut metrics.throughput;
        throughput.elapsed_seconds = logs.transform_span_seconds();
        throughput.avg_documents_per_second = if throughput.elapsed_seconds > 0.0 {
            throughput.total_documents_processed as f64 / throughput.elapsed_seconds
        } else {
            0.0
        };
        if throughput.peak_documents_per_second <= 0.0 {
            throughput.peak_documents_per_second = throughput.avg_documents_per_second;
        }
    }

    fn resource_metrics(readings: &[NodeReading]) -> (CpuMetrics, MemoryMetrics) {
        let cpu: Vec<f64> = readings.iter().filter_map(|r| r.cpu_percent).collect();
        let heap_percent: Vec<f64> = readings.iter().filter_map(|r| r.heap_used_percent).collect();
        let heap_mb: Vec<f64> = readings
            .iter()
            .filter_map(|r| r.heap_used_bytes)
            .map(|b| b / BYTES_PER_MB)
            .collect();

        let mut per_node_cpu: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut per_node_heap: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for reading in readings {
            if let Some(value) = reading.cpu_percent {
                per_node_cpu.entry(reading.node.clone()).or_default().push(value);
            }
            if let Some(value) = reading.heap_used_percent {
                per_node_heap.entry(reading.node.clone()).or_default().push(value);
            }
        }
        let averaged = |map: BTreeMap<String, Vec<f64>>| {
            map.into_iter()
                .map(|(node, values)| (node, stats::avg(&values)))
                .collect::<BTreeMap<_, _>>()
        };

        let sorted_cpu = stats::sorted(&cpu);
        (
            CpuMetrics {
                avg: stats::avg(&cpu),
                p95: stats::percentile(&sorted_cpu, 95.0),
                max: stats::max(&cpu),
                per_node: averaged(per_node_cpu),
            },
            MemoryMetrics {
                avg_heap_percent: stats::avg(&heap_percent),
                max_heap_percent: stats::max(&heap_percent),
                avg_heap_used_mb: stats::avg(&heap_mb),
                max_heap_used_mb: stats::max(&heap_mb),
                per_node: averaged(per_node_heap),
            },
        )
    }

    fn cluster_health(samples: &[HealthSample]) -> ClusterHealthMetrics {
        let active: Vec<f64> = samples.iter().filter_map(|s| s.active_shards).collect();
        let unassigned: Vec<f64> = samples.iter().filter_map(|s| s.unassigned_shards).collect();
        let nodes: Vec<f64> = samples.iter().filter_map(|s| s.number_of_nodes).collect();

        ClusterHealthMetrics {
            status: samples
                .iter()
                .rev()
                .find_map(|s| s.status.clone())
                .unwrap_or_else(|| ClusterHealthMetrics::default().status),
            avg_active_shards: stats::avg(&active),
            max_unassigned_shards: stats::max(&unassigned).max(0.0).round() as u64,
            avg_node_count: stats::avg(&nodes),
            samples: samples.len() as u64,
        }
    }
}
