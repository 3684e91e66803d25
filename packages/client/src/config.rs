//! Client configuration.

use parlor_shared::DEFAULT_PORT;

/// Where to connect and which name to log in with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
        }
    }

    /// Config for the default local server
    pub fn localhost(username: impl Into<String>) -> Self {
        Self::new("127.0.0.1", DEFAULT_PORT, username)
    }

    /// `host:port` string passed to `TcpStream::connect`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
