//! Connection registry.
//!
//! The registry is the single authority for id assignment and membership.
//! It is shared by every dispatcher task, the listener and the shutdown path.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicI32, Ordering},
    },
};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::sink::MessageSink;

/// One registered client connection
pub struct Connection {
    /// Display name, set once the client has sent its login message
    pub name: Option<String>,
    /// Write half of the transport
    pub sink: Arc<dyn MessageSink>,
    /// Stops the dispatcher reading from this connection
    pub cancel: CancellationToken,
}

/// Snapshot of a connection taken for fan-out
pub struct Recipient {
    pub id: i32,
    pub name: Option<String>,
    pub sink: Arc<dyn MessageSink>,
}

/// Participant entry as shown on the server console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: i32,
    pub name: String,
}

/// Concurrent map of connection id to connection state
pub struct ConnectionRegistry {
    /// Next id to hand out; ids are never reused
    next_id: AtomicI32,
    connections: Mutex<HashMap<i32, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(0),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next connection id
    pub fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Register a freshly accepted, not yet named connection
    pub async fn register(&self, id: i32, sink: Arc<dyn MessageSink>, cancel: CancellationToken) {
        let mut connections = self.connections.lock().await;
        connections.insert(
            id,
            Connection {
                name: None,
                sink,
                cancel,
            },
        );
        tracing::debug!("Connection {} registered", id);
    }

    /// Bind a display name to a registered connection.
    ///
    /// Returns `false` if the connection is no longer registered.
    pub async fn set_name(&self, id: i32, name: String) -> bool {
        let mut connections = self.connections.lock().await;
        match connections.get_mut(&id) {
            Some(connection) => {
                connection.name = Some(name);
                true
            }
            None => false,
        }
    }

    /// Display name of a connection, if it is registered and named
    pub async fn name_of(&self, id: i32) -> Option<String> {
        let connections = self.connections.lock().await;
        connections.get(&id).and_then(|c| c.name.clone())
    }

    /// Remove a connection, handing it back to the caller for cleanup
    pub async fn remove(&self, id: i32) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        connections.remove(&id)
    }

    /// Snapshot of every registered connection, named or not
    pub async fn recipients(&self) -> Vec<Recipient> {
        let connections = self.connections.lock().await;
        let mut recipients: Vec<Recipient> = connections
            .iter()
            .map(|(id, connection)| Recipient {
                id: *id,
                name: connection.name.clone(),
                sink: connection.sink.clone(),
            })
            .collect();
        recipients.sort_by_key(|r| r.id);
        recipients
    }

    /// Snapshot of the connections that completed the name handshake
    pub async fn named_recipients(&self) -> Vec<Recipient> {
        self.recipients()
            .await
            .into_iter()
            .filter(|r| r.name.is_some())
            .collect()
    }

    /// Ids of all registered connections
    pub async fn ids(&self) -> Vec<i32> {
        let connections = self.connections.lock().await;
        let mut ids: Vec<i32> = connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Named participants sorted by id
    pub async fn participants(&self) -> Vec<Participant> {
        let connections = self.connections.lock().await;
        let mut participants: Vec<Participant> = connections
            .iter()
            .filter_map(|(id, connection)| {
                connection.name.as_ref().map(|name| Participant {
                    id: *id,
                    name: name.clone(),
                })
            })
            .collect();
        participants.sort_by_key(|p| p.id);
        participants
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
