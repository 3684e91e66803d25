//! Parlor chat client.
//!
//! Connects to a Parlor server, completes the id/name handshake and relays
//! chat between the terminal and the server. Senders can be hidden locally
//! with `ban <name>`.

pub mod block_list;
pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
mod receiver;
mod runner;
mod session;
pub mod ui;

pub use block_list::BlockList;
pub use config::ClientConfig;
pub use error::ClientError;
pub use receiver::ClientEvent;
pub use runner::{SessionEnd, run_client};
pub use session::ChatClient;
