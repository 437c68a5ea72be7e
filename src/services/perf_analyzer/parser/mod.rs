//! Load-test log parser
//!
//! Turns the three log streams of a test run into typed samples.

pub mod composer;
pub mod core;
pub mod error;
pub mod log_locator;

pub use composer::{LogComposer, ParsedLogs};
pub use error::{ParseError, ParseResult};
pub use log_locator::{LogFileSet, LogKind};
