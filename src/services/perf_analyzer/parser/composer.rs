//! Log composer: one sequential pass over each of the three logs

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use super::core::{HealthSample, LogLineParser, NodeReading, RecordParser, TransformSample};
use super::error::{ParseError, ParseResult};
use super::log_locator::{LogFileSet, LogKind};

/// Typed samples of one test run, in file order
#[derive(Debug, Clone, Default)]
pub struct ParsedLogs {
    pub transforms: Vec<TransformSample>,
    pub nodes: Vec<NodeReading>,
    pub health: Vec<HealthSample>,
    /// Lines dropped as malformed, across all three files
    pub skipped_lines: usize,
}

impl ParsedLogs {
    /// Transform-log timestamps in file order
    pub fn transform_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.transforms.iter().map(|t| t.timestamp).collect()
    }

    /// Wall-clock span between first and last transform sample, in seconds
    pub fn transform_span_seconds(&self) -> f64 {
        match (self.transforms.first(), self.transforms.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
            },
            _ => 0.0,
        }
    }
}

/// Reads and parses a located log file set
#[derive(Debug, Default)]
pub struct LogComposer {
    logs: ParsedLogs,
}

impl LogComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse all three files of `files`
    pub fn parse(mut self, files: &LogFileSet) -> ParseResult<ParsedLogs> {
        for kind in LogKind::ALL {
            self.parse_file(kind, files.path(kind))?;
        }

        tracing::info!(
            "Parsed {} transform samples, {} node readings, {} health samples ({} lines skipped)",
            self.logs.transforms.len(),
            self.logs.nodes.len(),
            self.logs.health.len(),
            self.logs.skipped_lines
        );
        Ok(self.logs)
    }

    fn parse_file(&mut self, kind: LogKind, path: &Path) -> ParseResult<()> {
        let file = File::open(path)
            .map_err(|source| ParseError::ReadLog { path: path.to_path_buf(), source })?;
        self.parse_reader(kind, BufReader::new(file))
            .map_err(|source| ParseError::ReadLog { path: path.to_path_buf(), source })
    }

    /// Parse one stream of `kind`; only genuine I/O failures are errors
    pub fn parse_reader<R: BufRead>(&mut self, kind: LogKind, reader: R) -> std::io::Result<()> {
        let before = self.logs.skipped_lines;

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.logs.skipped_lines += 1;
                    continue;
                },
                Err(e) => return Err(e),
            };

            if line.trim().is_empty() {
                continue;
            }

            if !self.push_line(kind, &line) {
                self.logs.skipped_lines += 1;
            }
        }

        let skipped = self.logs.skipped_lines - before;
        if skipped > 0 {
            tracing::debug!("Skipped {} malformed {} lines", skipped, kind.marker());
        }
        Ok(())
    }

    /// Returns false when the line produced no sample
    fn push_line(&mut self, kind: LogKind, line: &str) -> bool {
        let Some(raw) = LogLineParser::parse_line(line) else {
            return false;
        };

        match kind {
            LogKind::TransformStats => match RecordParser::transform(&raw) {
                Some(sample) => {
                    self.logs.transforms.push(sample);
                    true
                },
                None => false,
            },
            LogKind::NodeStats => {
                let readings = RecordParser::node_readings(&raw);
                let found = !readings.is_empty();
                self.logs.nodes.extend(readings);
                found
            },
            LogKind::ClusterHealth => match RecordParser::health(&raw) {
                Some(sample) => {
                    self.logs.health.push(sample);
                    true
                },
                None => false,
            },
        }
    }

    pub fn finish(self) -> ParsedLogs {
        self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reader_skips_bad_lines() {
        let input = concat!(
            "2025-03-01T10:00:00Z - Transform t-host stats: {\"stats\":{\"search_total\":1}}\n",
            "garbage line\n",
            "\n",
            "2025-03-01T10:00:05Z - Transform t-host stats: {\"stats\":{\"search_total\":9}}\n",
            "2025-03-01T10:00:10Z - Transform t-host stats: {\"stats\":{\"search_t",
        );

        let mut composer = LogComposer::new();
        composer.parse_reader(LogKind::TransformStats, input.as_bytes()).unwrap();
        let logs = composer.finish();

        assert_eq!(logs.transforms.len(), 2);
        assert_eq!(logs.skipped_lines, 2);
        assert_eq!(logs.transform_span_seconds(), 5.0);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut input = b"2025-03-01T10:00:00Z - {\"status\":\"green\"}\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"2025-03-01T10:00:05Z - {\"status\":\"yellow\"}\n");

        let mut composer = LogComposer::new();
        composer.parse_reader(LogKind::ClusterHealth, input.as_slice()).unwrap();
        let logs = composer.finish();

        assert_eq!(logs.health.len(), 2);
        assert_eq!(logs.skipped_lines, 1);
    }

    #[test]
    fn test_empty_logs_have_zero_span() {
        assert_eq!(ParsedLogs::default().transform_span_seconds(), 0.0);
    }
}
