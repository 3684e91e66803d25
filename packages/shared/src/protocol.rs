//! Protocol message definitions.

use serde::{Deserialize, Serialize};

/// Default TCP port the server listens on
pub const DEFAULT_PORT: u16 = 1500;

/// Sender id reserved for the server itself
pub const SERVER_ID: i32 = -1;

/// Display name used when the server is the sender
pub const SYSTEM_NAME: &str = "system";

/// Substring marking a ban announcement in a chat payload
pub const BAN_NOTICE: &str = " has banned ";

/// Substring marking an unban announcement in a chat payload
pub const UNBAN_NOTICE: &str = " has unbanned ";

/// Separator between the sender name and the body of a broadcast line
const SENDER_SEPARATOR: &str = ": ";

/// Message type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Text,
    Login,
    Logout,
    Shutdown,
}

/// A single protocol message.
///
/// Messages are built by the sender, written to the transport and dropped by
/// the receiver once handled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub sender_id: i32,
    pub r#type: MessageType,
    pub payload: String,
}

impl Message {
    pub fn new(sender_id: i32, r#type: MessageType, payload: impl Into<String>) -> Self {
        Self {
            sender_id,
            r#type,
            payload: payload.into(),
        }
    }

    /// Ordinary chat text
    pub fn text(sender_id: i32, payload: impl Into<String>) -> Self {
        Self::new(sender_id, MessageType::Text, payload)
    }

    /// First message after the id handshake, carrying the display name
    pub fn login(sender_id: i32, username: impl Into<String>) -> Self {
        Self::new(sender_id, MessageType::Login, username)
    }

    pub fn logout(sender_id: i32) -> Self {
        Self::new(sender_id, MessageType::Logout, "")
    }

    /// Shutdown notice sent by the server
    pub fn shutdown(payload: impl Into<String>) -> Self {
        Self::new(SERVER_ID, MessageType::Shutdown, payload)
    }

    /// Whether the payload is a ban or unban announcement
    pub fn is_ban_notice(&self) -> bool {
        self.payload.contains(BAN_NOTICE) || self.payload.contains(UNBAN_NOTICE)
    }
}

/// Split a broadcast line of the form `"<sender>: <body>"`.
///
/// Returns `None` when the separator is missing.
pub fn split_sender(line: &str) -> Option<(&str, &str)> {
    line.split_once(SENDER_SEPARATOR)
}
