//! Provider error types.

use std::path::PathBuf;

/// Errors that stop a provider from reading its source at all.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Error converting a single source record.
///
/// These never abort a provider: the record is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown bus route pattern: {0}")]
    UnknownPattern(String),

    #[error("no calendar in id")]
    NoCalendar,

    #[error("no usable stop-times")]
    NoStopTimes,
}
