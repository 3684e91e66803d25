//! TCP chat client.
//!
//! Connects to a Parlor server and sends every line typed on stdin.
//! `ban <name>` hides messages from a user, `logout` (or Ctrl+D) leaves.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-client -- --username Alice
//! cargo run --bin parlor-client -- -H 192.168.0.10 -p 3000 -u Bob
//! ```

use clap::Parser;
use parlor_client::{ClientConfig, SessionEnd, run_client};
use parlor_shared::{DEFAULT_PORT, logger::setup_logger};

#[derive(Parser, Debug)]
#[command(name = "parlor-client")]
#[command(about = "TCP chat client with local ban support", long_about = None)]
struct Args {
    /// Display name shown to other participants
    #[arg(short = 'u', long)]
    username: String,

    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing; keep it quiet so logs do not break the prompt
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();
    let config = ClientConfig::new(args.host, args.port, args.username);

    match run_client(config).await {
        Ok(SessionEnd::Logout) | Ok(SessionEnd::ServerShutdown) => {}
        Ok(SessionEnd::ConnectionLost) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Client error: {}", e);
            std::process::exit(1);
        }
    }
}
