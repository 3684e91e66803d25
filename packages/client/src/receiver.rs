//! Receive task.
//!
//! Reads the assigned id, hands it to `start()` through a one-shot channel,
//! then decodes broadcast messages until shutdown, disconnect or read failure.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures_util::StreamExt;
use parlor_shared::{MessageCodec, read_client_id};
use tokio::{
    io::AsyncRead,
    sync::{mpsc, oneshot},
};
use tokio_util::codec::FramedRead;

use crate::{
    block_list::BlockList,
    domain::{Incoming, classify_incoming},
};

/// What the receive task surfaces to the session owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A broadcast line from a sender that is not blocked
    Chat { sender: String, line: String },
    /// The server is shutting down
    Shutdown(String),
    /// The server dropped the connection while the session was running
    ConnectionLost(String),
}

/// State shared between the receive task and the session
pub(crate) struct ReceiverContext {
    pub events: mpsc::UnboundedSender<ClientEvent>,
    pub running: Arc<AtomicBool>,
    pub block_list: BlockList,
}

/// Run the receive side of one session
pub(crate) async fn receive_loop<R>(
    mut reader: R,
    id_tx: oneshot::Sender<std::io::Result<i32>>,
    ctx: ReceiverContext,
) where
    R: AsyncRead + Unpin,
{
    match read_client_id(&mut reader).await {
        Ok(id) => {
            if id_tx.send(Ok(id)).is_err() {
                return;
            }
        }
        Err(e) => {
            let _ = id_tx.send(Err(e));
            return;
        }
    }

    let mut frames = FramedRead::new(reader, MessageCodec::new());
    while ctx.running.load(Ordering::SeqCst) {
        let message = match frames.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                lost(&ctx, e.to_string());
                break;
            }
            None => {
                lost(&ctx, "server closed the connection".to_string());
                break;
            }
        };

        let event = match classify_incoming(&message) {
            Incoming::Shutdown(payload) => {
                ctx.running.store(false, Ordering::SeqCst);
                let _ = ctx.events.send(ClientEvent::Shutdown(payload));
                break;
            }
            Incoming::Chat { sender, line } => {
                if ctx.block_list.contains(&sender).await {
                    tracing::debug!("Hiding message from blocked user '{}'", sender);
                    continue;
                }
                ClientEvent::Chat { sender, line }
            }
            Incoming::Malformed => {
                tracing::debug!("Skipping malformed message: {:?}", message.payload);
                continue;
            }
        };

        if ctx.events.send(event).is_err() {
            break;
        }
    }

    tracing::debug!("Receive task finished");
}

/// Report a read failure unless the session is already disconnecting
fn lost(ctx: &ReceiverContext, reason: String) {
    if ctx.running.load(Ordering::SeqCst) {
        tracing::warn!("Connection to server lost: {}", reason);
        let _ = ctx.events.send(ClientEvent::ConnectionLost(reason));
    } else {
        tracing::debug!("Read ended during disconnect: {}", reason);
    }
}
