//! CAN bus and decode error types.

use jo_protocol::Pgn;
use thiserror::Error;

/// Errors raised while receiving or decoding J1939 frames.
#[derive(Debug, Error)]
pub enum CanError {
    /// Bus-level fault reported by the frame source.
    #[error("CAN source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Receive timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("PGN {pgn}: payload too short, need {need} bytes, got {got}")]
    ShortPayload { pgn: Pgn, need: usize, got: usize },

    #[error("Unrecognized PGN {pgn}")]
    UnrecognizedPgn { pgn: Pgn },

    #[error("Frame encode error: {0}")]
    Encode(String),
}

impl CanError {
    /// Decode-level errors skip the frame; everything else stops ingestion.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            CanError::ShortPayload { .. } | CanError::UnrecognizedPgn { .. }
        )
    }
}

/// Convenience alias for CAN bus results.
pub type CanResult<T> = Result<T, CanError>;
