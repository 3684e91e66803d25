//! Client-local set of blocked sender names.
//!
//! Written by the input path, read by the receive task. It is never sent to
//! the server; blocking only hides messages on this client.

use std::{collections::HashSet, sync::Arc};

use tokio::sync::Mutex;

/// Shared handle to the blocked names
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    names: Arc<Mutex<HashSet<String>>>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block `name`; returns `false` if it was already blocked
    pub async fn ban(&self, name: &str) -> bool {
        self.names.lock().await.insert(name.to_string())
    }

    /// Unblock `name`; returns `false` if it was not blocked
    pub async fn unban(&self, name: &str) -> bool {
        self.names.lock().await.remove(name)
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.names.lock().await.contains(name)
    }

    /// Blocked names in alphabetical order
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.lock().await.iter().cloned().collect();
        names.sort();
        names
    }
}
