//! Chat client session management.

use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures_util::SinkExt;
use parlor_shared::{Message, MessageCodec};
use tokio::{
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::codec::FramedWrite;

use crate::{
    block_list::BlockList,
    config::ClientConfig,
    domain::{ban_announcement, unban_announcement},
    error::ClientError,
    receiver::{ClientEvent, ReceiverContext, receive_loop},
};

/// How long `disconnect` waits for the server to close the connection
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

type MessageWriter = FramedWrite<OwnedWriteHalf, MessageCodec>;

/// One client connection to the chat server.
///
/// The send path (user input) and the receive task run concurrently; they
/// share the running flag and the block list.
pub struct ChatClient {
    config: ClientConfig,
    /// Id assigned by the server during the handshake
    id: OnceLock<i32>,
    running: Arc<AtomicBool>,
    block_list: BlockList,
    writer: Mutex<Option<MessageWriter>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            id: OnceLock::new(),
            running: Arc::new(AtomicBool::new(false)),
            block_list: BlockList::new(),
            writer: Mutex::new(None),
            receiver: Mutex::new(None),
        }
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    /// Id assigned by the server, once `start` has succeeded
    pub fn id(&self) -> Option<i32> {
        self.id.get().copied()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    /// Connect, complete the handshake and start the receive task.
    ///
    /// Does not return before the receive task has read the assigned id.
    /// On failure the transport is closed and nothing is left running.
    ///
    /// # Returns
    ///
    /// The stream of events produced by the receive task.
    pub async fn start(&self) -> Result<mpsc::UnboundedReceiver<ClientEvent>, ClientError> {
        let mut writer_slot = self.writer.lock().await;
        if writer_slot.is_some() || self.id.get().is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let addr = self.config.addr();
        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => stream,
            Err(source) => {
                tracing::error!("Failed to connect to {}: {}", addr, source);
                return Err(ClientError::Connect { addr, source });
            }
        };
        let (read_half, write_half) = stream.into_split();

        let (id_tx, id_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.running.store(true, Ordering::SeqCst);
        let receiver = tokio::spawn(receive_loop(
            read_half,
            id_tx,
            ReceiverContext {
                events: events_tx,
                running: self.running.clone(),
                block_list: self.block_list.clone(),
            },
        ));

        let id = match id_rx.await {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => return Err(self.abort_start(receiver, e.to_string())),
            Err(_) => {
                return Err(self.abort_start(receiver, "receive task ended".to_string()));
            }
        };

        let mut writer = FramedWrite::new(write_half, MessageCodec::new());
        if let Err(e) = writer.send(Message::login(id, &self.config.username)).await {
            return Err(self.abort_start(receiver, e.to_string()));
        }

        let _ = self.id.set(id);
        *writer_slot = Some(writer);
        *self.receiver.lock().await = Some(receiver);
        tracing::info!(
            "Connected to {} as '{}' (id {})",
            addr,
            self.config.username,
            id
        );

        Ok(events_rx)
    }

    /// Undo a half-finished `start`; dropping the halves closes the socket
    fn abort_start(&self, receiver: JoinHandle<()>, reason: String) -> ClientError {
        self.running.store(false, Ordering::SeqCst);
        receiver.abort();
        tracing::error!("Handshake with {} failed: {}", self.config.addr(), reason);
        ClientError::Handshake(reason)
    }

    /// Write one message to the server.
    ///
    /// Failures are logged and returned; the session stays usable.
    pub async fn send_message(&self, message: Message) -> Result<(), ClientError> {
        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            tracing::warn!("Cannot send message: not connected");
            return Err(ClientError::NotConnected);
        };

        writer.send(message).await.map_err(|e| {
            tracing::warn!("Failed to send message: {}", e);
            ClientError::Send(e)
        })
    }

    /// Send chat text under the assigned id
    pub async fn send_text(&self, text: &str) -> Result<(), ClientError> {
        let id = self.id().ok_or(ClientError::NotConnected)?;
        self.send_message(Message::text(id, text)).await
    }

    /// Leave the chat.
    ///
    /// Sends a best-effort `LOGOUT`, closes the transport and stops the
    /// receive task. Safe to call before `start` and more than once.
    pub async fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let id = self.id().unwrap_or_default();
            if let Err(e) = writer.send(Message::logout(id)).await {
                tracing::debug!("Failed to send logout: {}", e);
            }
            if let Err(e) = writer.close().await {
                tracing::debug!("Failed to close connection: {}", e);
            }
            tracing::info!("Disconnected from {}", self.config.addr());
        }

        let receiver = self.receiver.lock().await.take();
        if let Some(mut receiver) = receiver
            && tokio::time::timeout(DISCONNECT_GRACE, &mut receiver)
                .await
                .is_err()
        {
            receiver.abort();
        }
    }

    /// Hide messages from `name` on this client.
    ///
    /// Returns `false` if `name` was already blocked. A newly blocked name is
    /// announced as ordinary chat text.
    pub async fn ban_user(&self, name: &str) -> bool {
        if !self.block_list.ban(name).await {
            return false;
        }
        let _ = self
            .send_text(&ban_announcement(&self.config.username, name))
            .await;
        true
    }

    /// Show messages from `name` again.
    ///
    /// Returns `false` if `name` was not blocked.
    pub async fn unban_user(&self, name: &str) -> bool {
        if !self.block_list.unban(name).await {
            return false;
        }
        let _ = self
            .send_text(&unban_announcement(&self.config.username, name))
            .await;
        true
    }
}
