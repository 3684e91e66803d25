//! Domain logic for server-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use std::fmt;

use parlor_shared::{Message, MessageType, SERVER_ID, SYSTEM_NAME};

/// Name used when a sender id is not (or no longer) registered
pub const UNKNOWN_NAME: &str = "unknown";

/// Lifecycle of one dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Transport open, id assigned and sent
    Accepted,
    /// Waiting for the login message carrying the display name
    AwaitingName,
    /// Name bound, relaying chat traffic
    Active,
    /// Removed from the registry, transport closed
    Closed,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accepted => "accepted",
            Self::AwaitingName => "awaiting-name",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// What an active dispatcher does with one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundAction {
    /// Leave the active state and clean up
    Close,
    /// Ban/unban announcement: log only
    LogNotice,
    /// Relay to every named connection
    Broadcast,
}

/// Decide how to handle a message received in the active state.
///
/// # Arguments
///
/// * `message` - The message read from the client
/// * `alive` - Whether the server is still running
pub fn classify_inbound(message: &Message, alive: bool) -> InboundAction {
    if message.r#type == MessageType::Logout || !alive {
        InboundAction::Close
    } else if message.is_ban_notice() {
        InboundAction::LogNotice
    } else {
        InboundAction::Broadcast
    }
}

/// Resolve the display name shown for a sender id.
///
/// The server's own id maps to [`SYSTEM_NAME`]; ids without a registered
/// name map to [`UNKNOWN_NAME`].
pub fn resolve_sender_name(sender_id: i32, registered: Option<String>) -> String {
    if sender_id == SERVER_ID {
        return SYSTEM_NAME.to_string();
    }
    registered.unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

/// Build the message actually fanned out: `"<name>: <body>"`, keeping the
/// original sender id and type.
pub fn format_broadcast(message: &Message, sender_name: &str) -> Message {
    Message::new(
        message.sender_id,
        message.r#type,
        format!("{}: {}", sender_name, message.payload),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_logout_closes() {
        // テスト項目: LOGOUT を受け取ると切断処理に移る
        // given (前提条件):
        let message = Message::logout(0);

        // when (操作):
        let action = classify_inbound(&message, true);

        // then (期待する結果):
        assert_eq!(action, InboundAction::Close);
    }

    #[test]
    fn test_classify_closes_when_server_not_alive() {
        // テスト項目: サーバー停止中は通常メッセージでも切断処理に移る
        // given (前提条件):
        let message = Message::text(0, "hello");

        // when (操作):
        let action = classify_inbound(&message, false);

        // then (期待する結果):
        assert_eq!(action, InboundAction::Close);
    }

    #[test]
    fn test_classify_ban_notice_is_logged_only() {
        // テスト項目: ban/unban の告知はブロードキャストされない
        // given (前提条件):
        let ban = Message::text(0, "alice has banned bob");
        let unban = Message::text(0, "alice has unbanned bob");

        // when (操作):
        let actions = (classify_inbound(&ban, true), classify_inbound(&unban, true));

        // then (期待する結果):
        assert_eq!(actions, (InboundAction::LogNotice, InboundAction::LogNotice));
    }

    #[test]
    fn test_classify_text_is_broadcast() {
        // テスト項目: 通常のテキストはブロードキャストされる
        // given (前提条件):
        let message = Message::text(2, "hello");

        // when (操作):
        let action = classify_inbound(&message, true);

        // then (期待する結果):
        assert_eq!(action, InboundAction::Broadcast);
    }

    #[test]
    fn test_resolve_sender_name() {
        // テスト項目: 送信者 ID から表示名を解決する
        // given (前提条件):

        // when (操作):
        let system = resolve_sender_name(SERVER_ID, None);
        let alice = resolve_sender_name(0, Some("alice".to_string()));
        let unknown = resolve_sender_name(9, None);

        // then (期待する結果):
        assert_eq!(system, "system");
        assert_eq!(alice, "alice");
        assert_eq!(unknown, "unknown");
    }

    #[test]
    fn test_format_broadcast_keeps_sender_and_type() {
        // テスト項目: 整形後のメッセージは元の送信者 ID と種別を保持する
        // given (前提条件):
        let message = Message::text(0, "hello");

        // when (操作):
        let formatted = format_broadcast(&message, "A");

        // then (期待する結果):
        assert_eq!(formatted.sender_id, 0);
        assert_eq!(formatted.r#type, MessageType::Text);
        assert_eq!(formatted.payload, "A: hello");
    }

    #[test]
    fn test_dispatcher_state_display() {
        // テスト項目: 状態がログ向けの文字列で表示される
        // given (前提条件):
        let state = DispatcherState::AwaitingName;

        // when (操作):
        let label = state.to_string();

        // then (期待する結果):
        assert_eq!(label, "awaiting-name");
    }
}
