//! Interactive client loop.
//!
//! Reads user input with rustyline on a dedicated thread and prints events
//! from the receive task until logout, server shutdown or connection loss.

use parlor_shared::time::{Clock, SystemClock};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    domain::{UserCommand, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    receiver::ClientEvent,
    session::ChatClient,
    ui::{prompt, redisplay_prompt},
};

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `logout` or closed stdin
    Logout,
    /// The server announced its shutdown
    ServerShutdown,
    /// The server dropped the connection
    ConnectionLost,
}

/// Run one interactive chat session
pub async fn run_client(config: ClientConfig) -> Result<SessionEnd, ClientError> {
    let client = ChatClient::new(config);
    let mut events = client.start().await?;
    let username = client.username().to_string();

    print!(
        "{}",
        MessageFormatter::format_welcome(&username, client.id().unwrap_or_default())
    );
    let mut input = spawn_line_reader(prompt(&username));

    let end = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Chat { line, .. }) => {
                    print!(
                        "{}",
                        MessageFormatter::format_chat_line(&line, SystemClock.now_millis())
                    );
                    redisplay_prompt(&username);
                }
                Some(ClientEvent::Shutdown(notice)) => {
                    print!("{}", MessageFormatter::format_shutdown(&notice));
                    break SessionEnd::ServerShutdown;
                }
                Some(ClientEvent::ConnectionLost(reason)) => {
                    print!("{}", MessageFormatter::format_connection_lost(&reason));
                    break SessionEnd::ConnectionLost;
                }
                None => break SessionEnd::ConnectionLost,
            },
            line = input.recv() => match line {
                Some(line) => {
                    if let Some(end) = handle_input(&client, &line).await {
                        break end;
                    }
                }
                None => break SessionEnd::Logout,
            },
        }
    };

    client.disconnect().await;
    tracing::info!("Session ended: {:?}", end);
    Ok(end)
}

/// Execute one line of user input; returns `Some` when the session should end
pub(crate) async fn handle_input(client: &ChatClient, line: &str) -> Option<SessionEnd> {
    match parse_input(line) {
        UserCommand::Empty => {}
        UserCommand::Logout => return Some(SessionEnd::Logout),
        UserCommand::Ban(name) => {
            let changed = client.ban_user(&name).await;
            print!("{}", MessageFormatter::format_banned(&name, changed));
        }
        UserCommand::Unban(name) => {
            let changed = client.unban_user(&name).await;
            print!("{}", MessageFormatter::format_unbanned(&name, changed));
        }
        UserCommand::Usage(usage) => {
            print!("{}", MessageFormatter::format_usage(usage));
        }
        UserCommand::Chat(text) => {
            // Failures are already logged by the session.
            let _ = client.send_text(&text).await;
        }
    }
    None
}

/// Spawn a blocking thread for rustyline and forward each line.
///
/// The channel closes on Ctrl+C, Ctrl+D or a readline error.
fn spawn_line_reader(prompt: String) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    rx
}
