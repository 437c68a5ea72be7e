//! Value parsing utilities for load-test log payloads
//!
//! Flattens JSON payloads into dotted keys and coerces the human-readable
//! strings the search engine sometimes emits ("12.5%", "1.5gb", "1,024")
//! into plain numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

static NUMBER_WITH_UNIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    // Support formats: "12.5%", "1.5gb", "512 MB", "1,024", "-3"
    Regex::new(r"(?i)^(-?[\d,]*\.?\d+)\s*(%|b|kb|mb|gb|tb|pb|ms)?$").unwrap()
});

/// A flattened payload leaf
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value; strings are coerced when they look numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => ValueParser::parse_number(s),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Number(_) => None,
        }
    }
}

/// Value parser for log payload fields
pub struct ValueParser;

impl ValueParser {
    /// Flatten a JSON document into `dotted.key -> leaf` pairs
    ///
    /// Array elements are keyed by index. Nulls are dropped and booleans
    /// become text so every leaf is either a number or a string.
    pub fn flatten(value: &Value) -> BTreeMap<String, FieldValue> {
        let mut out = BTreeMap::new();
        Self::flatten_into(value, String::new(), &mut out);
        out
    }

    fn flatten_into(value: &Value, prefix: String, out: &mut BTreeMap<String, FieldValue>) {
        let join = |key: &str| {
            if prefix.is_empty() { key.to_string() } else { format!("{}.{}", prefix, key) }
        };

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    Self::flatten_into(child, join(key), out);
                }
            },
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    Self::flatten_into(child, join(&idx.to_string()), out);
                }
            },
            Value::Number(n) => {
                if let Some(f) = n.as_f64()
                    && f.is_finite()
                {
                    out.insert(prefix, FieldValue::Number(f));
                }
            },
            Value::String(s) => {
                out.insert(prefix, FieldValue::Text(s.clone()));
            },
            Value::Bool(b) => {
                out.insert(prefix, FieldValue::Text(b.to_string()));
            },
            Value::Null => {},
        }
    }

    /// Parse a human-readable number
    ///
    /// Byte units scale by 1024 so the result is always in bytes; percent and
    /// millisecond suffixes are stripped.
    pub fn parse_number(input: &str) -> Option<f64> {
        let input = input.trim();
        let cap = NUMBER_WITH_UNIT_REGEX.captures(input)?;
        let num: f64 = cap.get(1)?.as_str().replace(',', "").parse().ok()?;

        let multiplier = match cap.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("kb") => 1024.0,
            Some("mb") => 1024.0 * 1024.0,
            Some("gb") => 1024.0 * 1024.0 * 1024.0,
            Some("tb") => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            Some("pb") => 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
            _ => 1.0,
        };

        let value = num * multiplier;
        value.is_finite().then_some(value)
    }
}
