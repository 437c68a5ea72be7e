//! Parser error types for load-test log extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a parse pass
///
/// Individual malformed lines never surface here; they are skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Logs directory not readable: {path}: {source}")]
    LogsDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Missing log files for prefix '{prefix}': need {missing:?}, found {found:?}"
    )]
    MissingLogFiles { prefix: String, missing: Vec<&'static str>, found: Vec<String> },

    #[error("Failed to read log file {path}: {source}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
