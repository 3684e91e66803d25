//! Parlor chat server.
//!
//! Accepts TCP connections, assigns each one an id, binds the display name
//! sent by the client and fans every chat message out to all named clients.

pub mod config;
pub mod console;
mod dispatcher;
pub mod domain;
pub mod error;
pub mod registry;
mod server;
pub mod signal;
pub mod sink;

pub use config::ServerConfig;
pub use error::ServerError;
pub use registry::Participant;
pub use server::{ChatServer, SHUTDOWN_NOTICE};
