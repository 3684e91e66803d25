//! Error types for the chat client.

use parlor_shared::ProtocolError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The id/name handshake did not complete
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// `start` was called on a session that is already running
    #[error("Session is already connected")]
    AlreadyConnected,

    /// No open transport to write to
    #[error("Not connected to a server")]
    NotConnected,

    /// Writing to the transport failed
    #[error("Failed to send message: {0}")]
    Send(#[from] ProtocolError),
}
