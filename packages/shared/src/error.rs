//! Error types for the wire protocol.

use thiserror::Error;

/// Errors raised while reading or writing protocol frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying transport failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame body was not a valid message
    #[error("Malformed message body: {0}")]
    Json(#[from] serde_json::Error),
}
