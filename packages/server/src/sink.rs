//! Outbound side of a client connection.
//!
//! The registry only ever talks to a connection through [`MessageSink`], so
//! broadcast can be exercised without sockets.

use async_trait::async_trait;
use futures_util::SinkExt;
use parlor_shared::{Message, MessageCodec, ProtocolError};
use tokio::{io::AsyncWrite, sync::Mutex};
use tokio_util::codec::FramedWrite;

/// Write half of one client connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Write one message and flush it
    async fn send(&self, message: Message) -> Result<(), ProtocolError>;

    /// Flush and shut down the write half; later sends fail
    async fn close(&self);
}

/// [`MessageSink`] writing length-prefixed frames to an async writer.
///
/// Writes are serialized by the inner mutex, so a broadcast and a close from
/// different tasks never interleave on the wire.
pub struct FramedMessageSink<W> {
    writer: Mutex<Option<FramedWrite<W, MessageCodec>>>,
}

impl<W> FramedMessageSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(FramedWrite::new(writer, MessageCodec::new()))),
        }
    }
}

#[async_trait]
impl<W> MessageSink for FramedMessageSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, message: Message) -> Result<(), ProtocolError> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(framed) => framed.send(message).await,
            None => Err(ProtocolError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection already closed",
            ))),
        }
    }

    async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Some(mut framed) = writer.take()
            && let Err(e) = framed.close().await
        {
            tracing::debug!("Error while closing connection: {}", e);
        }
    }
}
