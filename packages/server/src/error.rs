//! Error types for the chat server.

use thiserror::Error;

/// Server-specific errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
