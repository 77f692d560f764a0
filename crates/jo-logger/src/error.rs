//! Logger error types.

use thiserror::Error;

/// Errors that stop the logger or abort a single operation.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage rejected a record. Fatal: odometer continuity needs every write.
    #[error("record sink write failed: {0}")]
    SinkWrite(String),

    #[error("record sink query failed: {0}")]
    SinkQuery(String),

    /// The frame source reported a bus-level fault.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Convenience alias for logger results.
pub type LoggerResult<T> = Result<T, LoggerError>;
