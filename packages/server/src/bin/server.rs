//! TCP chat server with broadcast functionality.
//!
//! Accepts clients, assigns ids and relays every chat message to all
//! connected clients. Type `shutdown` on the console (or press Ctrl+C) to stop.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-server
//! cargo run --bin parlor-server -- --host 127.0.0.1 --port 3000
//! ```

use clap::Parser;
use parlor_server::{
    ChatServer, ServerConfig,
    console::{run_console, spawn_stdin_reader},
    signal::shutdown_signal,
};
use parlor_shared::{DEFAULT_PORT, logger::setup_logger};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "parlor-server")]
#[command(about = "TCP chat server with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let server = ChatServer::new(ServerConfig::new(args.host, args.port));

    let runner = server.clone();
    let mut listener_task = tokio::spawn(async move { runner.startup().await });

    println!("Type 'shutdown' to stop the server, 'list' to show participants.");
    let console = spawn_stdin_reader();

    tokio::select! {
        result = &mut listener_task => {
            match result {
                Ok(Err(e)) => tracing::error!("Server error: {}", e),
                Err(e) => tracing::error!("Listener task failed: {}", e),
                Ok(Ok(())) => {}
            }
            server.shutdown().await;
            std::process::exit(1);
        }
        _ = wait_for_console_shutdown(&server, console) => {}
        _ = shutdown_signal() => {}
    }

    server.shutdown().await;
    if let Err(e) = listener_task.await {
        tracing::error!("Listener task failed: {}", e);
    }
}

/// Resolve when `shutdown` is typed; a closed console leaves Ctrl+C as the only way out
async fn wait_for_console_shutdown(server: &ChatServer, console: mpsc::UnboundedReceiver<String>) {
    if !run_console(server, console).await {
        tracing::info!("Console closed, press Ctrl+C to stop the server");
        std::future::pending::<()>().await;
    }
}
