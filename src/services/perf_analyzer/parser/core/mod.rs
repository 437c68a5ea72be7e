//! Core parsing components for load-test logs

pub mod line_parser;
pub mod record_parser;
pub mod value_parser;

pub use line_parser::{LogLineParser, RawSample};
pub use record_parser::{HealthSample, NodeReading, RecordParser, TransformSample};
pub use value_parser::{FieldValue, ValueParser};
