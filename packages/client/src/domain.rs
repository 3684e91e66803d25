//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use parlor_shared::{BAN_NOTICE, Message, MessageType, UNBAN_NOTICE, split_sender};

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Blank line
    Empty,
    Logout,
    Ban(String),
    Unban(String),
    /// `ban`/`unban` without a name
    Usage(&'static str),
    /// Anything else is sent as chat text
    Chat(String),
}

/// Interpret a line typed by the user.
///
/// # Arguments
///
/// * `line` - The raw input line
///
/// # Returns
///
/// The command to execute. Keywords are matched case-insensitively.
pub fn parse_input(line: &str) -> UserCommand {
    let line = line.trim();
    if line.is_empty() {
        return UserCommand::Empty;
    }
    if line.eq_ignore_ascii_case("logout") {
        return UserCommand::Logout;
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    if keyword.eq_ignore_ascii_case("ban") {
        if rest.is_empty() {
            UserCommand::Usage("ban <name>")
        } else {
            UserCommand::Ban(rest.to_string())
        }
    } else if keyword.eq_ignore_ascii_case("unban") {
        if rest.is_empty() {
            UserCommand::Usage("unban <name>")
        } else {
            UserCommand::Unban(rest.to_string())
        }
    } else {
        UserCommand::Chat(line.to_string())
    }
}

/// What the receive task does with one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Server is going away; terminal
    Shutdown(String),
    /// Broadcast line whose sender could be parsed
    Chat { sender: String, line: String },
    /// No `"sender: body"` shape; skipped without error
    Malformed,
}

/// Classify a message received from the server
pub fn classify_incoming(message: &Message) -> Incoming {
    if message.r#type == MessageType::Shutdown {
        return Incoming::Shutdown(message.payload.clone());
    }

    match split_sender(&message.payload) {
        Some((sender, _)) => Incoming::Chat {
            sender: sender.to_string(),
            line: message.payload.clone(),
        },
        None => Incoming::Malformed,
    }
}

/// Chat text announcing that `me` blocked `name`
pub fn ban_announcement(me: &str, name: &str) -> String {
    format!("{}{}{}", me, BAN_NOTICE, name)
}

/// Chat text announcing that `me` unblocked `name`
pub fn unban_announcement(me: &str, name: &str) -> String {
    format!("{}{}{}", me, UNBAN_NOTICE, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_logout() {
        // テスト項目: logout は大文字小文字を区別せずログアウトになる
        // given (前提条件):
        let lines = ["logout", "LOGOUT", "  Logout "];

        // when (操作):
        let commands: Vec<UserCommand> = lines.iter().map(|l| parse_input(l)).collect();

        // then (期待する結果):
        assert!(commands.iter().all(|c| *c == UserCommand::Logout));
    }

    #[test]
    fn test_parse_input_ban_and_unban() {
        // テスト項目: ban/unban コマンドから対象の名前を取り出す
        // given (前提条件):

        // when (操作):
        let ban = parse_input("ban bob");
        let unban = parse_input("unban   bob  ");

        // then (期待する結果):
        assert_eq!(ban, UserCommand::Ban("bob".to_string()));
        assert_eq!(unban, UserCommand::Unban("bob".to_string()));
    }

    #[test]
    fn test_parse_input_ban_without_name() {
        // テスト項目: 名前のない ban は使い方の表示になる
        // given (前提条件):

        // when (操作):
        let ban = parse_input("ban");
        let unban = parse_input("unban ");

        // then (期待する結果):
        assert_eq!(ban, UserCommand::Usage("ban <name>"));
        assert_eq!(unban, UserCommand::Usage("unban <name>"));
    }

    #[test]
    fn test_parse_input_chat() {
        // テスト項目: コマンド以外の入力はチャットとして送られる
        // given (前提条件):

        // when (操作):
        let hello = parse_input("hello world");
        let banana = parse_input("banana split");
        let logout_later = parse_input("logout later");

        // then (期待する結果):
        assert_eq!(hello, UserCommand::Chat("hello world".to_string()));
        assert_eq!(banana, UserCommand::Chat("banana split".to_string()));
        assert_eq!(logout_later, UserCommand::Chat("logout later".to_string()));
    }

    #[test]
    fn test_parse_input_empty() {
        // テスト項目: 空行は何もしない
        // given (前提条件):

        // when (操作):
        let command = parse_input("   ");

        // then (期待する結果):
        assert_eq!(command, UserCommand::Empty);
    }

    #[test]
    fn test_classify_incoming_chat() {
        // テスト項目: "sender: body" 形式は送信者付きのチャットになる
        // given (前提条件):
        let message = Message::text(1, "B: hi");

        // when (操作):
        let incoming = classify_incoming(&message);

        // then (期待する結果):
        assert_eq!(
            incoming,
            Incoming::Chat {
                sender: "B".to_string(),
                line: "B: hi".to_string()
            }
        );
    }

    #[test]
    fn test_classify_incoming_malformed() {
        // テスト項目: 区切りのない本文は読み飛ばし対象になる
        // given (前提条件):
        let message = Message::text(1, "garbage");

        // when (操作):
        let incoming = classify_incoming(&message);

        // then (期待する結果):
        assert_eq!(incoming, Incoming::Malformed);
    }

    #[test]
    fn test_classify_incoming_shutdown() {
        // テスト項目: SHUTDOWN は本文の形式に関係なく終了通知になる
        // given (前提条件):
        let message = Message::shutdown("system: Server is shutting down...");

        // when (操作):
        let incoming = classify_incoming(&message);

        // then (期待する結果):
        assert_eq!(
            incoming,
            Incoming::Shutdown("system: Server is shutting down...".to_string())
        );
    }

    #[test]
    fn test_announcements_are_recognized_as_notices() {
        // テスト項目: ban/unban の告知文はサーバー側で告知として判定される
        // given (前提条件):
        let ban = Message::text(0, ban_announcement("alice", "bob"));
        let unban = Message::text(0, unban_announcement("alice", "bob"));

        // when (操作):

        // then (期待する結果):
        assert_eq!(ban.payload, "alice has banned bob");
        assert_eq!(unban.payload, "alice has unbanned bob");
        assert!(ban.is_ban_notice() && unban.is_ban_notice());
    }
}
