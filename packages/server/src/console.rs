//! Administrative console read from stdin.

use std::io::BufRead;

use tokio::sync::mpsc;

use crate::server::ChatServer;

/// Command typed on the server console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Shutdown,
    List,
    Unknown(String),
}

/// Parse one console line; blank lines yield `None`
pub fn parse_console_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let command = if line.eq_ignore_ascii_case("shutdown") {
        ConsoleCommand::Shutdown
    } else if line.eq_ignore_ascii_case("list") {
        ConsoleCommand::List
    } else {
        ConsoleCommand::Unknown(line.to_string())
    };
    Some(command)
}

/// Forward stdin lines from a dedicated thread.
///
/// A plain thread is used so that a pending blocking read never keeps the
/// runtime alive on exit.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Handle console commands until `shutdown` or end of input.
///
/// Returns `true` if the operator asked for a shutdown.
pub async fn run_console(server: &ChatServer, mut lines: mpsc::UnboundedReceiver<String>) -> bool {
    while let Some(line) = lines.recv().await {
        match parse_console_command(&line) {
            Some(ConsoleCommand::Shutdown) => return true,
            Some(ConsoleCommand::List) => {
                let participants = server.participants().await;
                if participants.is_empty() {
                    println!("(No participants)");
                }
                for participant in participants {
                    println!("{:>4}  {}", participant.id, participant.name);
                }
            }
            Some(ConsoleCommand::Unknown(other)) => {
                println!("Unknown command '{}'. Type 'shutdown' or 'list'.", other);
            }
            None => {}
        }
    }
    false
}
