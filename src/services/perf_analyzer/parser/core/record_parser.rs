//! Typed views over raw samples, one per log kind

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::line_parser::RawSample;

/// One transform stats entry
///
/// Every counter here is cumulative since the transform started.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformSample {
    pub timestamp: DateTime<Utc>,
    pub transform_id: String,
    pub state: Option<String>,
    pub health: Option<String>,
    pub search_time_ms: f64,
    pub search_count: f64,
    pub index_time_ms: f64,
    pub index_count: f64,
    pub processing_time_ms: f64,
    pub processing_count: f64,
    pub documents_processed: f64,
    pub documents_indexed: f64,
    pub pages_processed: f64,
    pub trigger_count: f64,
    pub search_failures: f64,
    pub index_failures: f64,
    pub exp_avg_checkpoint_duration_ms: Option<f64>,
    pub exp_avg_documents_indexed: Option<f64>,
    pub exp_avg_documents_processed: Option<f64>,
}

/// Resource reading of one node at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReading {
    pub timestamp: DateTime<Utc>,
    pub node: String,
    pub cpu_percent: Option<f64>,
    pub heap_used_percent: Option<f64>,
    pub heap_used_bytes: Option<f64>,
    pub heap_max_bytes: Option<f64>,
}

/// Cluster health snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSample {
    pub timestamp: DateTime<Utc>,
    pub status: Option<String>,
    pub active_shards: Option<f64>,
    pub unassigned_shards: Option<f64>,
    pub number_of_nodes: Option<f64>,
}

/// Builds typed samples from raw ones
pub struct RecordParser;

impl RecordParser {
    /// Counters may sit under `stats.` (API shape) or at the top level
    fn counter(raw: &RawSample, name: &str) -> Option<f64> {
        let nested = format!("stats.{}", name);
        raw.number(&[nested.as_str(), name])
    }

    /// Typed transform sample; `None` when no transform id is known
    pub fn transform(raw: &RawSample) -> Option<TransformSample> {
        let transform_id = raw
            .source_id
            .clone()
            .or_else(|| raw.text(&["id", "transform_id"]).map(str::to_string))?;

        let value = |name: &str| Self::counter(raw, name).unwrap_or(0.0);

        Some(TransformSample {
            timestamp: raw.timestamp,
            transform_id,
            state: raw.text(&["state"]).map(str::to_string),
            health: raw.text(&["health.status"]).map(str::to_string),
            search_time_ms: value("search_time_in_ms"),
            search_count: value("search_total"),
            index_time_ms: value("index_time_in_ms"),
            index_count: value("index_total"),
            processing_time_ms: value("processing_time_in_ms"),
            processing_count: value("processing_total"),
            documents_processed: value("documents_processed"),
            documents_indexed: value("documents_indexed"),
            pages_processed: value("pages_processed"),
            trigger_count: value("trigger_count"),
            search_failures: value("search_failures"),
            index_failures: value("index_failures"),
            exp_avg_checkpoint_duration_ms: Self::counter(
                raw,
                "exponential_avg_checkpoint_duration_ms",
            ),
            exp_avg_documents_indexed: Self::counter(raw, "exponential_avg_documents_indexed"),
            exp_avg_documents_processed: Self::counter(raw, "exponential_avg_documents_processed"),
        })
    }

    /// One reading per node found under `nodes.<id>.`
    pub fn node_readings(raw: &RawSample) -> Vec<NodeReading> {
        let mut grouped: BTreeMap<&str, BTreeMap<&str, &super::FieldValue>> = BTreeMap::new();
        for (key, value) in &raw.raw_fields {
            if let Some(rest) = key.strip_prefix("nodes.")
                && let Some((node_id, field)) = rest.split_once('.')
            {
                grouped.entry(node_id).or_default().insert(field, value);
            }
        }

        grouped
            .into_iter()
            .map(|(node_id, fields)| {
                let number = |key: &str| fields.get(key).and_then(|v| v.as_number());
                let node = fields
                    .get("name")
                    .and_then(|v| v.as_text())
                    .unwrap_or(node_id)
                    .to_string();

                NodeReading {
                    timestamp: raw.timestamp,
                    node,
                    cpu_percent: number("os.cpu.percent"),
                    heap_used_percent: number("jvm.mem.heap_used_percent"),
                    heap_used_bytes: number("jvm.mem.heap_used_in_bytes"),
                    heap_max_bytes: number("jvm.mem.heap_max_in_bytes"),
                }
            })
            .collect()
    }

    /// Cluster health snapshot; `None` when the line carries none of its fields
    pub fn health(raw: &RawSample) -> Option<HealthSample> {
        let sample = HealthSample {
            timestamp: raw.timestamp,
            status: raw.text(&["status"]).map(str::to_string),
            active_shards: raw.number(&["active_shards"]),
            unassigned_shards: raw.number(&["unassigned_shards"]),
            number_of_nodes: raw.number(&["number_of_nodes"]),
        };

        let empty = sample.status.is_none()
            && sample.active_shards.is_none()
            && sample.unassigned_shards.is_none()
            && sample.number_of_nodes.is_none();
        (!empty).then_some(sample)
    }
}
