//! Performance baseline data models
//!
//! These models represent the structured metrics extracted from one load-test run.
//! They serialize to camelCase JSON so saved baselines stay readable and stable
//! across releases. Every numeric leaf defaults to zero, which lets older or
//! sparse baseline files load and compare without special cases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::analyzer::entity::EntityType;

// ============================================================================
// Latency Statistics
// ============================================================================

/// Summary statistics over one latency series (milliseconds per operation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LatencyStats {
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

// ============================================================================
// Test Configuration
// ============================================================================

/// Parameters of the load test that produced the logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TestConfig {
    pub entity_count: u64,
    pub logs_per_entity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
}

// ============================================================================
// Resource Metrics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuMetrics {
    pub avg: f64,
    pub p95: f64,
    pub max: f64,
    /// Average CPU percent per node name
    pub per_node: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryMetrics {
    pub avg_heap_percent: f64,
    pub max_heap_percent: f64,
    pub avg_heap_used_mb: f64,
    pub max_heap_used_mb: f64,
    /// Average heap percent per node name
    pub per_node: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ThroughputMetrics {
    pub avg_documents_per_second: f64,
    pub peak_documents_per_second: f64,
    pub total_documents_processed: u64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexEfficiency {
    /// documents indexed / documents processed
    pub ratio: f64,
    pub total_documents_indexed: u64,
    pub total_documents_processed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CounterTotal {
    pub total: u64,
}

/// Moving averages reported by the transform itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ExponentialAverages {
    pub checkpoint_duration_ms: AvgMax,
    pub documents_indexed: AvgMax,
    pub documents_processed: AvgMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AvgMax {
    pub avg: f64,
    pub max: f64,
}

// ============================================================================
// Per Entity Type
// ============================================================================

/// How many samples fed each series of an entity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SampleCounts {
    /// Raw transform samples classified into the bucket
    pub total: u64,
    pub search: u64,
    pub intake: u64,
    pub processing: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityTypeMetrics {
    pub search_latency: LatencyStats,
    pub intake_latency: LatencyStats,
    pub processing_latency: LatencyStats,
    /// Cumulative counters: maximum observed value, never a sum
    pub documents_processed: u64,
    pub documents_indexed: u64,
    pub pages_processed: u64,
    pub trigger_count: u64,
    pub sample_counts: SampleCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PerEntityTypeMetrics {
    pub host: EntityTypeMetrics,
    pub user: EntityTypeMetrics,
    pub service: EntityTypeMetrics,
    pub generic: EntityTypeMetrics,
}

impl PerEntityTypeMetrics {
    pub fn get(&self, entity_type: EntityType) -> &EntityTypeMetrics {
        match entity_type {
            EntityType::Host => &self.host,
            EntityType::User => &self.user,
            EntityType::Service => &self.service,
            EntityType::Generic => &self.generic,
        }
    }

    pub fn get_mut(&mut self, entity_type: EntityType) -> &mut EntityTypeMetrics {
        match entity_type {
            EntityType::Host => &mut self.host,
            EntityType::User => &mut self.user,
            EntityType::Service => &mut self.service,
            EntityType::Generic => &mut self.generic,
        }
    }
}

// ============================================================================
// Transform Health
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformStateMetrics {
    /// Sample count per reported transform state (indexing, started, ...)
    pub state_counts: BTreeMap<String, u64>,
    pub failed_samples: u64,
    /// Samples whose health status was reported and not green
    pub unhealthy_samples: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorMetrics {
    pub search_failures: u64,
    pub index_failures: u64,
    pub total_failures: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterHealthMetrics {
    /// Last status seen in the health log
    pub status: String,
    pub avg_active_shards: f64,
    pub max_unassigned_shards: u64,
    pub avg_node_count: f64,
    pub samples: u64,
}

impl Default for ClusterHealthMetrics {
    fn default() -> Self {
        Self {
            status: "unknown".to_string(),
            avg_active_shards: 0.0,
            max_unassigned_shards: 0,
            avg_node_count: 0.0,
            samples: 0,
        }
    }
}

// ============================================================================
// Baseline Record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Metrics {
    pub search_latency: LatencyStats,
    pub intake_latency: LatencyStats,
    pub processing_latency: LatencyStats,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub throughput: ThroughputMetrics,
    pub index_efficiency: IndexEfficiency,
    pub pages_processed: CounterTotal,
    pub trigger_count: CounterTotal,
    pub exponential_averages: ExponentialAverages,
    pub per_entity_type: PerEntityTypeMetrics,
    pub transform_states: TransformStateMetrics,
    pub errors: ErrorMetrics,
    pub cluster_health: ClusterHealthMetrics,
}

/// Sampling cadence detected in the transform log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingSummary {
    pub interval_ms: f64,
    pub batch_count: u64,
    pub min_search_count: u64,
    pub min_index_count: u64,
    pub min_processing_count: u64,
}

/// Persisted snapshot of one test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BaselineMetrics {
    pub test_name: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub test_config: TestConfig,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingSummary>,
}

// ============================================================================
// Comparison Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Improvement,
    Degradation,
    Warning,
    Stable,
    Insufficient,
    Info,
}

impl ComparisonStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            ComparisonStatus::Improvement => "✅",
            ComparisonStatus::Degradation => "❌",
            ComparisonStatus::Warning => "⚠️",
            ComparisonStatus::Insufficient => "📊",
            ComparisonStatus::Info => "ℹ️",
            ComparisonStatus::Stable => "➖",
        }
    }
}

/// Report grouping of a compared metric, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    SearchLatency,
    IntakeLatency,
    ProcessingLatency,
    Cpu,
    Memory,
    Throughput,
    IndexEfficiency,
    Counters,
    ExponentialAverages,
    TransformStates,
    Entity(EntityType),
    Errors,
}

impl MetricCategory {
    pub fn title(&self) -> String {
        match self {
            MetricCategory::SearchLatency => "Search Latency".to_string(),
            MetricCategory::IntakeLatency => "Intake Latency".to_string(),
            MetricCategory::ProcessingLatency => "Processing Latency".to_string(),
            MetricCategory::Cpu => "CPU".to_string(),
            MetricCategory::Memory => "Memory".to_string(),
            MetricCategory::Throughput => "Throughput".to_string(),
            MetricCategory::IndexEfficiency => "Index Efficiency".to_string(),
            MetricCategory::Counters => "Pages & Triggers".to_string(),
            MetricCategory::ExponentialAverages => "Exponential Averages".to_string(),
            MetricCategory::TransformStates => "Transform States".to_string(),
            MetricCategory::Entity(entity) => format!("Entity Type: {}", entity.label()),
            MetricCategory::Errors => "Errors".to_string(),
        }
    }
}

/// One compared metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub metric: String,
    pub category: MetricCategory,
    pub baseline: f64,
    pub current: f64,
    pub diff: f64,
    pub diff_percent: f64,
    pub status: ComparisonStatus,
    pub integer_valued: bool,
}

/// Tally of statuses; `info` rows are not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub improvements: usize,
    pub degradations: usize,
    pub warnings: usize,
    pub stable: usize,
    pub insufficient: usize,
}

impl ComparisonSummary {
    pub fn record(&mut self, status: ComparisonStatus) {
        match status {
            ComparisonStatus::Improvement => self.improvements += 1,
            ComparisonStatus::Degradation => self.degradations += 1,
            ComparisonStatus::Warning => self.warnings += 1,
            ComparisonStatus::Stable => self.stable += 1,
            ComparisonStatus::Insufficient => self.insufficient += 1,
            ComparisonStatus::Info => {},
        }
    }

    pub fn total(&self) -> usize {
        self.improvements + self.degradations + self.warnings + self.stable + self.insufficient
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub baseline_name: String,
    pub current_name: String,
    pub results: Vec<ComparisonResult>,
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    pub fn has_degradations(&self) -> bool {
        self.summary.degradations > 0
    }

    pub fn by_status(&self, status: ComparisonStatus) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(move |r| r.status == status)
    }
}
