//! Text rendering of a comparison report
//!
//! Rows are grouped under their category title and aligned into fixed-width
//! columns computed over the whole report.

use std::fmt::Write;

use crate::services::perf_analyzer::models::{
    ComparisonReport, ComparisonResult, ComparisonStatus, MetricCategory,
};

const MEMORY_UNIT_MARKERS: [&str; 3] = ["(KB)", "(MB)", "(GB)"];
const HEADERS: [&str; 5] = ["Metric", "Baseline", "Current", "Diff", "Diff %"];
const COLUMN_GAP: &str = "  ";

/// Decimal places for one row's values
///
/// Counts render whole, memory sizes with 2 decimals. Anything else gets 2,
/// or 3 when either side is below 1, or 4 when both are below 1 and closer
/// than 0.01.
pub fn precision(result: &ComparisonResult) -> usize {
    if result.integer_valued {
        return 0;
    }
    if MEMORY_UNIT_MARKERS.iter().any(|m| result.metric.contains(m)) {
        return 2;
    }

    let (baseline, current) = (result.baseline.abs(), result.current.abs());
    if baseline < 1.0 && current < 1.0 && (result.baseline - result.current).abs() < 0.01 {
        4
    } else if baseline < 1.0 || current < 1.0 {
        3
    } else {
        2
    }
}

struct Row<'a> {
    cells: [String; 5],
    status: ComparisonStatus,
    category: &'a MetricCategory,
}

impl<'a> Row<'a> {
    fn new(result: &'a ComparisonResult) -> Self {
        let p = precision(result);
        Self {
            cells: [
                result.metric.clone(),
                format!("{:.*}", p, result.baseline),
                format!("{:.*}", p, result.current),
                format!("{:+.*}", p, result.diff),
                format!("{:+.1}%", result.diff_percent),
            ],
            status: result.status,
            category: &result.category,
        }
    }
}

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format(report: &ComparisonReport) -> String {
        let rows: Vec<Row> = report.results.iter().map(Row::new).collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Performance comparison: {} (baseline) vs {} (current)",
            report.baseline_name, report.current_name
        );

        let header: [String; 5] = HEADERS.map(str::to_string);
        let mut current_category: Option<&MetricCategory> = None;
        for row in &rows {
            if current_category != Some(row.category) {
                current_category = Some(row.category);
                let _ = writeln!(out);
                let _ = writeln!(out, "=== {} ===", row.category.title());
                Self::write_line(&mut out, &header, &widths, "Status");
            }
            let status = format!("{} {}", row.status.glyph(), Self::status_label(row.status));
            Self::write_line(&mut out, &row.cells, &widths, &status);
        }

        let s = &report.summary;
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Summary: {} {} improved, {} {} degraded, {} {} warning, {} {} stable, \
             {} {} insufficient data",
            ComparisonStatus::Improvement.glyph(),
            s.improvements,
            ComparisonStatus::Degradation.glyph(),
            s.degradations,
            ComparisonStatus::Warning.glyph(),
            s.warnings,
            ComparisonStatus::Stable.glyph(),
            s.stable,
            ComparisonStatus::Insufficient.glyph(),
            s.insufficient,
        );
        out
    }

    fn write_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5], status: &str) {
        let _ = write!(out, "{:<width$}", cells[0], width = widths[0]);
        for (cell, width) in cells.iter().zip(widths).skip(1) {
            let _ = write!(out, "{}{:>width$}", COLUMN_GAP, cell, width = *width);
        }
        let _ = writeln!(out, "{}{}", COLUMN_GAP, status);
    }

    fn status_label(status: ComparisonStatus) -> &'static str {
        match status {
            ComparisonStatus::Improvement => "improvement",
            ComparisonStatus::Degradation => "degradation",
            ComparisonStatus::Warning => "warning",
            ComparisonStatus::Stable => "stable",
            ComparisonStatus::Insufficient => "insufficient",
            ComparisonStatus::Info => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::perf_analyzer::analyzer::entity::EntityType;
    use crate::services::perf_analyzer::models::ComparisonSummary;

    fn result(metric: &str, baseline: f64, current: f64) -> ComparisonResult {
        ComparisonResult {
            metric: metric.to_string(),
            category: MetricCategory::SearchLatency,
            baseline,
            current,
            diff: current - baseline,
            diff_percent: 0.0,
            status: ComparisonStatus::Stable,
            integer_valued: false,
        }
    }

    #[test]
    fn test_precision_rules() {
        assert_eq!(precision(&result("Search Latency Avg (ms)", 12.0, 13.5)), 2);
        assert_eq!(precision(&result("Search Latency Avg (ms)", 0.5, 13.5)), 3);
        assert_eq!(precision(&result("Search Latency Avg (ms)", 0.5, 0.6)), 3);
        assert_eq!(precision(&result("Search Latency Avg (ms)", 0.512, 0.515)), 4);
        assert_eq!(precision(&result("Heap Used Avg (MB)", 0.5, 0.501)), 2);

        let mut count = result("Search Failures", 3.0, 4.0);
        count.integer_valued = true;
        assert_eq!(precision(&count), 0);
    }

    #[test]
    fn test_format_groups_and_aligns() {
        let mut degraded = result("Search Latency Avg (ms)", 10.0, 13.0);
        degraded.diff_percent = 30.0;
        degraded.status = ComparisonStatus::Degradation;

        let mut failures = result("Search Failures", 0.0, 2.0);
        failures.category = MetricCategory::Errors;
        failures.integer_valued = true;
        failures.diff_percent = 100.0;
        failures.status = ComparisonStatus::Degradation;

        let mut host = result("Search Latency Avg (ms)", 4.0, 5.0);
        host.category = MetricCategory::Entity(EntityType::Host);
        host.status = ComparisonStatus::Insufficient;

        let mut summary = ComparisonSummary::default();
        for r in [&degraded, &host, &failures] {
            summary.record(r.status);
        }
        let report = ComparisonReport {
            baseline_name: "base".to_string(),
            current_name: "cur".to_string(),
            results: vec![degraded, host, failures],
            summary,
        };

        let text = ReportFormatter::format(&report);
        assert!(text.starts_with("Performance comparison: base (baseline) vs cur (current)"));

        let search = text.find("=== Search Latency ===").unwrap();
        let entity = text.find("=== Entity Type: Host ===").unwrap();
        let errors = text.find("=== Errors ===").unwrap();
        assert!(search < entity && entity < errors);

        assert!(text.contains("10.00"));
        assert!(text.contains("+3.00"));
        assert!(text.contains("+30.0%"));
        assert!(text.contains("❌ degradation"));
        assert!(text.contains("📊 insufficient"));
        assert!(text.contains("+100.0%"));
        assert!(text.contains("❌ 2 degraded"));
        assert!(text.contains("📊 1 insufficient data"));

        // Every data line places the status column at the same offset
        let status_columns: Vec<usize> = text
            .lines()
            .filter(|l| l.ends_with("degradation") || l.ends_with("insufficient"))
            .map(|l| l.chars().take_while(|c| !matches!(c, '❌' | '📊')).count())
            .collect();
        assert_eq!(status_columns.len(), 3);
        assert!(status_columns.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_integer_rows_have_no_decimals() {
        let mut pages = result("Pages Processed", 1200.0, 1350.0);
        pages.integer_valued = true;
        pages.category = MetricCategory::Counters;
        let report = ComparisonReport {
            baseline_name: "a".to_string(),
            current_name: "b".to_string(),
            results: vec![pages],
            summary: ComparisonSummary::default(),
        };

        let text = ReportFormatter::format(&report);
        let line = text.lines().find(|l| l.starts_with("Pages Processed")).unwrap();
        assert!(line.contains("1200"));
        assert!(line.contains("+150"));
        assert!(!line.contains("1200.0"));
    }
}
