//! Line grammar shared by the three load-test logs
//!
//! `<ISO-timestamp> - [Transform <id> stats: ]<JSON>`

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use super::value_parser::{FieldValue, ValueParser};

static LOG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-\s+(?:Transform\s+(\S+)\s+stats:\s*)?(\{.*\})\s*$").unwrap()
});

/// One parsed log line, before it is typed by kind
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    /// Transform id from the `Transform <id> stats:` marker, if any
    pub source_id: Option<String>,
    pub raw_fields: BTreeMap<String, FieldValue>,
}

impl RawSample {
    /// First field among `keys` that reads as a number
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .find_map(|key| self.raw_fields.get(*key).and_then(FieldValue::as_number))
    }

    /// First field among `keys` that holds text
    pub fn text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.raw_fields.get(*key).and_then(FieldValue::as_text))
    }
}

/// Parser for a single log line
pub struct LogLineParser;

impl LogLineParser {
    /// Parse one line; `None` when the line does not fit the grammar
    ///
    /// Truncated writes and non-JSON payloads are expected in append-only
    /// test logs, so failure here is never an error.
    pub fn parse_line(line: &str) -> Option<RawSample> {
        let caps = LOG_LINE_REGEX.captures(line)?;
        let timestamp = Self::parse_timestamp(caps.get(1)?.as_str())?;
        let source_id = caps.get(2).map(|m| m.as_str().to_string());

        let payload: serde_json::Value = serde_json::from_str(caps.get(3)?.as_str()).ok()?;
        if !payload.is_object() {
            return None;
        }

        Some(RawSample { timestamp, source_id, raw_fields: ValueParser::flatten(&payload) })
    }

    /// Parse an RFC 3339 timestamp; a missing offset is read as UTC
    pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
            return Some(ts.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_transform_line() {
        let line = r#"2025-03-01T10:00:05.123Z - Transform entities-v1-latest-security_host_default stats: {"id":"entities-v1-latest-security_host_default","stats":{"search_total":10}}"#;
        let sample = LogLineParser::parse_line(line).unwrap();

        assert_eq!(sample.source_id.as_deref(), Some("entities-v1-latest-security_host_default"));
        assert_eq!(sample.number(&["stats.search_total"]), Some(10.0));
        assert_eq!(
            sample.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 5).unwrap()
                + chrono::Duration::milliseconds(123)
        );
    }

    #[test]
    fn test_parse_plain_json_line() {
        let line = r#"2025-03-01T10:00:05Z - {"status":"green","active_shards":12}"#;
        let sample = LogLineParser::parse_line(line).unwrap();

        assert!(sample.source_id.is_none());
        assert_eq!(sample.text(&["status"]), Some("green"));
        assert_eq!(sample.number(&["missing", "active_shards"]), Some(12.0));
    }

    #[test]
    fn test_parse_timestamp_without_offset() {
        let ts = LogLineParser::parse_timestamp("2025-03-01T10:00:05.500").unwrap();
        assert_eq!(ts.timestamp_millis() % 1000, 500);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        // Truncated mid-write
        assert!(LogLineParser::parse_line(r#"2025-03-01T10:00:05Z - {"status":"gre"#).is_none());
        // No timestamp
        assert!(LogLineParser::parse_line(r#"{"status":"green"}"#).is_none());
        // Bad timestamp
        assert!(LogLineParser::parse_line(r#"yesterday - {"status":"green"}"#).is_none());
        // Non-object payload
        assert!(LogLineParser::parse_line("2025-03-01T10:00:05Z - {1}").is_none());
        assert!(LogLineParser::parse_line("").is_none());
    }
}
