//! End-to-end tests for the transform performance analyzer
//!
//! Each test writes a synthetic set of load-test logs into a temporary
//! directory, extracts baselines from them and compares the results.

#[cfg(test)]
mod end_to_end_tests {
    use crate::services::perf_analyzer::analyzer::EntityType;
    use crate::services::perf_analyzer::*;
    use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
    use serde_json::json;
    use std::fmt::Write as _;
    use std::path::Path;

    const TRANSFORMS: [&str; 3] = [
        "entities-v1-latest-security_host_default",
        "entities-v1-latest-security_user_default",
        "entities-v1-latest-security_service_default",
    ];
    const TICKS: i64 = 12;

    fn ts(tick: i64, offset_ms: i64) -> String {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        (start + Duration::milliseconds(tick * 5_000 + offset_ms))
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Write the three logs of one run; every search takes `search_ms`
    fn write_run(dir: &Path, prefix: &str, search_ms: u64, docs_per_tick: u64) {
        let mut transforms = String::new();
        let mut nodes = String::new();
        let mut health = String::new();

        for tick in 0..TICKS {
            let n = tick as u64;
            for (i, id) in TRANSFORMS.iter().enumerate() {
                let payload = json!({
                    "id": id,
                    "state": "indexing",
                    "health": {"status": "green"},
                    "stats": {
                        "search_total": n * 10,
                        "search_time_in_ms": n * 10 * search_ms,
                        "index_total": n * 20,
                        "index_time_in_ms": n * 20 * 2,
                        "processing_total": n * 10,
                        "processing_time_in_ms": n * 10,
                        "documents_processed": n * docs_per_tick,
                        "documents_indexed": n * docs_per_tick / 2,
                        "pages_processed": n * 3,
                        "trigger_count": n,
                        "search_failures": 0,
                        "index_failures": 0,
                        "exponential_avg_checkpoint_duration_ms": 120.0,
                        "exponential_avg_documents_processed": docs_per_tick as f64,
                    }
                });
                let _ = writeln!(
                    transforms,
                    "{} - Transform {} stats: {}",
                    ts(tick, i as i64 * 10),
                    id,
                    payload
                );
            }

            let node_payload = json!({
                "nodes": {
                    "n1": {
                        "name": "es-0",
                        "os": {"cpu": {"percent": 40}},
                        "jvm": {"mem": {"heap_used_percent": 50, "heap_used_in_bytes": 536870912}}
                    },
                    "n2": {
                        "name": "es-1",
                        "os": {"cpu": {"percent": 60}},
                        "jvm": {"mem": {"heap_used_percent": 70, "heap_used_in_bytes": 1073741824}}
                    },
                }
            });
            let _ = writeln!(nodes, "{} - {}", ts(tick, 500), node_payload);

            let health_payload = json!({
                "status": "green",
                "active_shards": 20,
                "unassigned_shards": 0,
                "number_of_nodes": 2,
            });
            let _ = writeln!(health, "{} - {}", ts(tick, 700), health_payload);
        }

        // Logs may be cut off mid-write
        transforms.push_str("2025-03-01T10:01:00.000Z - Transform x stats: {\"stats\":{\"sea");

        std::fs::write(dir.join(format!("{}-transform-stats.log", prefix)), transforms).unwrap();
        std::fs::write(dir.join(format!("{}-node-stats.log", prefix)), nodes).unwrap();
        std::fs::write(dir.join(format!("{}-cluster-health.log", prefix)), health).unwrap();
    }

    fn config() -> TestConfig {
        TestConfig {
            entity_count: 1_000,
            logs_per_entity: 10,
            upload_count: None,
            interval_ms: Some(5_000),
        }
    }

    #[test]
    fn test_extract_baseline_from_logs() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "run-a", 10, 100);

        let baseline = extract_baseline(dir.path(), "run-a", "run-a", config()).unwrap();
        let m = &baseline.metrics;

        assert_eq!(baseline.test_name, "run-a");
        assert_eq!(baseline.test_config, config());

        let sampling = baseline.sampling.unwrap();
        assert_eq!(sampling.interval_ms, 5_000.0);
        assert_eq!(sampling.batch_count, TICKS as u64);
        assert_eq!(sampling.min_search_count, 5);

        assert_eq!(m.search_latency.avg, 10.0);
        assert_eq!(m.search_latency.p99, 10.0);
        assert_eq!(m.intake_latency.avg, 2.0);
        assert_eq!(m.processing_latency.avg, 1.0);

        let host = m.per_entity_type.get(EntityType::Host);
        assert_eq!(host.sample_counts.total, TICKS as u64);
        assert_eq!(host.sample_counts.search, TICKS as u64 - 1);
        assert_eq!(host.documents_processed, 1_100);
        assert_eq!(host.documents_indexed, 550);
        assert_eq!(host.pages_processed, 33);
        assert_eq!(host.trigger_count, 11);
        assert_eq!(m.per_entity_type.generic.sample_counts.total, 0);

        assert_eq!(m.throughput.total_documents_processed, 3_300);
        assert_eq!(m.index_efficiency.ratio, 0.5);
        assert_eq!(m.pages_processed.total, 99);
        assert_eq!(m.trigger_count.total, 33);
        assert!((m.throughput.peak_documents_per_second - 20.0).abs() < 1e-9);
        assert!(m.throughput.avg_documents_per_second > 59.0);
        assert!(m.throughput.avg_documents_per_second < 60.1);

        assert_eq!(m.exponential_averages.checkpoint_duration_ms.avg, 120.0);
        assert_eq!(m.transform_states.state_counts.get("indexing"), Some(&(3 * TICKS as u64)));
        assert_eq!(m.transform_states.unhealthy_samples, 0);
        assert_eq!(m.errors.total_failures, 0);

        assert_eq!(m.cpu.avg, 50.0);
        assert_eq!(m.cpu.max, 60.0);
        assert_eq!(m.cpu.per_node.get("es-1"), Some(&60.0));
        assert_eq!(m.memory.max_heap_used_mb, 1_024.0);
        assert_eq!(m.memory.avg_heap_used_mb, 768.0);

        assert_eq!(m.cluster_health.status, "green");
        assert_eq!(m.cluster_health.avg_active_shards, 20.0);
        assert_eq!(m.cluster_health.samples, TICKS as u64);
    }

    #[test]
    fn test_missing_log_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "run-a", 10, 100);
        std::fs::remove_file(dir.path().join("run-a-node-stats.log")).unwrap();

        match extract_baseline(dir.path(), "run-a", "run-a", config()) {
            Err(ParseError::MissingLogFiles { missing, found, .. }) => {
                assert_eq!(missing, vec!["node-stats"]);
                assert_eq!(found.len(), 2);
            },
            other => panic!("expected MissingLogFiles, got {:?}", other.map(|b| b.test_name)),
        }
    }

    #[test]
    fn test_slower_run_is_reported_as_degradation() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "run-a", 10, 100);
        write_run(dir.path(), "run-b", 13, 100);

        let base = extract_baseline(dir.path(), "run-a", "run-a", config()).unwrap();
        let cur = extract_baseline(dir.path(), "run-b", "run-b", config()).unwrap();
        let report = compare_baselines(&base, &cur, &ThresholdOverrides::default());

        let status = |category: MetricCategory, metric: &str| {
            report
                .results
                .iter()
                .find(|r| r.category == category && r.metric == metric)
                .map(|r| r.status)
        };

        assert_eq!(
            status(MetricCategory::SearchLatency, "Search Latency Avg (ms)"),
            Some(ComparisonStatus::Degradation)
        );
        assert_eq!(
            status(MetricCategory::SearchLatency, "Search Latency P99 (ms)"),
            Some(ComparisonStatus::Info)
        );
        assert_eq!(
            status(MetricCategory::Entity(EntityType::Host), "Search Latency Avg (ms)"),
            Some(ComparisonStatus::Degradation)
        );
        assert_eq!(
            status(MetricCategory::Entity(EntityType::Service), "Search Latency Avg (ms)"),
            Some(ComparisonStatus::Degradation)
        );
        assert_eq!(
            status(MetricCategory::IntakeLatency, "Intake Latency Avg (ms)"),
            Some(ComparisonStatus::Stable)
        );
        assert!(report.has_degradations());

        let text = ReportFormatter::format(&report);
        assert!(text.contains("=== Search Latency ==="));
        assert!(text.contains("=== Entity Type: Service ==="));
        assert!(text.contains("❌ degradation"));
    }

    #[test]
    fn test_relaxed_thresholds_downgrade_to_warning() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "run-a", 10, 100);
        write_run(dir.path(), "run-b", 13, 100);

        let base = extract_baseline(dir.path(), "run-a", "run-a", config()).unwrap();
        let cur = extract_baseline(dir.path(), "run-b", "run-b", config()).unwrap();
        let overrides =
            ThresholdOverrides { degradation_threshold: Some(50.0), ..Default::default() };
        let report = compare_baselines(&base, &cur, &overrides);

        let row = report
            .results
            .iter()
            .find(|r| {
                r.metric == "Search Latency Avg (ms)" && r.category == MetricCategory::SearchLatency
            })
            .unwrap();
        assert_eq!(row.status, ComparisonStatus::Warning);
    }

    #[test]
    fn test_saved_baseline_compares_stable_against_itself() {
        let logs = tempfile::tempdir().unwrap();
        let baselines = tempfile::tempdir().unwrap();
        write_run(logs.path(), "run-a", 10, 100);

        let baseline = extract_baseline(logs.path(), "run-a", "run-a", config()).unwrap();
        let store = BaselineStore::new(baselines.path());
        store.save(&baseline).unwrap();

        let loaded = store.load_by_pattern("run-a").unwrap();
        assert_eq!(loaded, baseline);

        let report = compare_baselines(&loaded, &baseline, &ThresholdOverrides::default());
        assert!(!report.has_degradations());
        assert_eq!(report.summary.improvements, 0);
        assert_eq!(report.summary.warnings, 0);
        assert_eq!(report.summary.insufficient, 0);
    }
}
