//! Message formatting utilities for client display.

use parlor_shared::time::format_local_time_of_day;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the greeting printed once the session is ready
    ///
    /// # Arguments
    ///
    /// * `username` - The name this client logged in with
    /// * `client_id` - The id assigned by the server
    pub fn format_welcome(username: &str, client_id: i32) -> String {
        format!(
            "\nYou are '{}' (id {}). Type messages and press Enter to send.\n\
             Commands: logout | ban <name> | unban <name>\n",
            username, client_id
        )
    }

    /// Format a broadcast chat line
    ///
    /// # Arguments
    ///
    /// * `line` - The `"sender: body"` line as relayed by the server
    /// * `received_at` - Unix timestamp when the line arrived (milliseconds)
    ///
    /// # Returns
    ///
    /// The line prefixed with the local time of day
    pub fn format_chat_line(line: &str, received_at: i64) -> String {
        format!("\n[{}] {}\n", format_local_time_of_day(received_at), line)
    }

    /// Format the server shutdown notice
    pub fn format_shutdown(notice: &str) -> String {
        format!("\n*** {} ***\n", notice)
    }

    /// Format the message shown when the server went away unexpectedly
    pub fn format_connection_lost(reason: &str) -> String {
        format!("\n*** Connection to server lost: {} ***\n", reason)
    }

    /// Format the result of a ban command
    pub fn format_banned(name: &str, changed: bool) -> String {
        if changed {
            format!("Messages from '{}' are now hidden\n", name)
        } else {
            format!("'{}' is already banned\n", name)
        }
    }

    /// Format the result of an unban command
    pub fn format_unbanned(name: &str, changed: bool) -> String {
        if changed {
            format!("Messages from '{}' are shown again\n", name)
        } else {
            format!("'{}' is not banned\n", name)
        }
    }

    pub fn format_usage(usage: &str) -> String {
        format!("Usage: {}\n", usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_welcome() {
        // テスト項目: 接続時の案内に名前・ID・コマンド一覧が含まれる
        // given (前提条件):
        let username = "alice";
        let client_id = 3;

        // when (操作):
        let result = MessageFormatter::format_welcome(username, client_id);

        // then (期待する結果):
        assert!(result.contains("'alice' (id 3)"));
        assert!(result.contains("ban <name>"));
        assert!(result.contains("logout"));
    }

    #[test]
    fn test_format_chat_line() {
        // テスト項目: チャット行に時刻が付与され、本文はそのまま表示される
        // given (前提条件):
        let line = "bob: hello";
        let received_at = 1_700_000_000_000;

        // when (操作):
        let result = MessageFormatter::format_chat_line(line, received_at);

        // then (期待する結果):
        let expected_time = format_local_time_of_day(received_at);
        assert!(result.contains(&format!("[{}] bob: hello", expected_time)));
    }

    #[test]
    fn test_format_shutdown() {
        // テスト項目: シャットダウン通知が強調して表示される
        // given (前提条件):
        let notice = "system: Server is shutting down...";

        // when (操作):
        let result = MessageFormatter::format_shutdown(notice);

        // then (期待する結果):
        assert!(result.contains("*** system: Server is shutting down... ***"));
    }

    #[test]
    fn test_format_connection_lost() {
        // テスト項目: 接続断の理由が表示される
        // given (前提条件):
        let reason = "server closed the connection";

        // when (操作):
        let result = MessageFormatter::format_connection_lost(reason);

        // then (期待する結果):
        assert!(result.contains("Connection to server lost"));
        assert!(result.contains("server closed the connection"));
    }

    #[test]
    fn test_format_ban_results() {
        // テスト項目: ban/unban の結果が状態の変化に応じて表示される
        // given (前提条件):
        let name = "bob";

        // when (操作):
        let banned = MessageFormatter::format_banned(name, true);
        let already = MessageFormatter::format_banned(name, false);
        let unbanned = MessageFormatter::format_unbanned(name, true);
        let not_banned = MessageFormatter::format_unbanned(name, false);

        // then (期待する結果):
        assert!(banned.contains("now hidden"));
        assert!(already.contains("already banned"));
        assert!(unbanned.contains("shown again"));
        assert!(not_banned.contains("not banned"));
    }

    #[test]
    fn test_format_usage() {
        // テスト項目: 使い方の表示
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_usage("ban <name>");

        // then (期待する結果):
        assert_eq!(result, "Usage: ban <name>\n");
    }
}
