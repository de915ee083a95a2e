//! Report forwarding errors

use thiserror::Error;

/// Errors raised while building or running forwarding sinks.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Transport-level failure talking to a sink
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Sink answered with a non-success status
    #[error("{sink} responded with HTTP {status}")]
    Status { sink: &'static str, status: u16 },

    /// Error-tracking DSN could not be parsed
    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
