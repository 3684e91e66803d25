//! Chat server: listener, broadcast and shutdown orchestration.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parlor_shared::Message;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    dispatcher::handle_connection,
    domain::{format_broadcast, resolve_sender_name},
    error::ServerError,
    registry::{ConnectionRegistry, Participant, Recipient},
};

/// Payload of the notice sent to every client on shutdown
pub const SHUTDOWN_NOTICE: &str = "Server is shutting down...";

/// Shared server state
struct ServerState {
    config: ServerConfig,
    registry: ConnectionRegistry,
    /// Cleared once by `shutdown`
    alive: AtomicBool,
    /// Parent of every dispatcher token; cancelling it stops the listener
    shutdown_token: CancellationToken,
}

/// TCP chat server
///
/// Cloning is cheap; every clone refers to the same registry and lifecycle.
///
/// # Example
///
/// ```no_run
/// use parlor_server::{ChatServer, ServerConfig};
///
/// # async fn example() -> Result<(), parlor_server::ServerError> {
/// let server = ChatServer::new(ServerConfig::default());
/// let runner = server.clone();
/// tokio::spawn(async move { runner.startup().await });
/// // ...
/// server.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatServer {
    state: Arc<ServerState>,
}

impl ChatServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Arc::new(ServerState {
                config,
                registry: ConnectionRegistry::new(),
                alive: AtomicBool::new(true),
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub(crate) fn registry(&self) -> &ConnectionRegistry {
        &self.state.registry
    }

    /// Whether `shutdown` has not been called yet
    pub fn is_alive(&self) -> bool {
        self.state.alive.load(Ordering::SeqCst)
    }

    pub(crate) fn child_token(&self) -> CancellationToken {
        self.state.shutdown_token.child_token()
    }

    /// Bind the configured address and accept connections until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the listening socket cannot be bound.
    pub async fn startup(&self) -> Result<(), ServerError> {
        let addr = self.state.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until shutdown.
    ///
    /// Each accepted connection gets its own dispatcher task. Accept errors
    /// are logged and ignored while the server is alive.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        tracing::info!("Chat server listening on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                _ = self.state.shutdown_token.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if !self.is_alive() {
                            break;
                        }
                        tracing::info!("Accepted connection from {}", peer);
                        tokio::spawn(handle_connection(self.clone(), stream, peer));
                    }
                    Err(e) => {
                        if !self.is_alive() {
                            break;
                        }
                        tracing::error!("Failed to accept connection: {}", e);
                    }
                },
            }
        }

        tracing::info!("Listener stopped");
        Ok(())
    }

    /// Stop the server.
    ///
    /// Every registered client receives one `SHUTDOWN` message, then all
    /// connections are removed and the listener stops. Calling it again is a
    /// no-op.
    pub async fn shutdown(&self) {
        if !self.state.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!("Shutdown already in progress");
            return;
        }
        tracing::info!("Shutting down chat server");

        let notice = format_broadcast(
            &Message::shutdown(SHUTDOWN_NOTICE),
            &resolve_sender_name(parlor_shared::SERVER_ID, None),
        );
        let recipients = self.state.registry.recipients().await;
        deliver(&recipients, &notice).await;

        for id in self.state.registry.ids().await {
            self.remove(id).await;
        }
        self.state.shutdown_token.cancel();

        tracing::info!("Server shutdown complete");
    }

    /// Remove a connection and close its transport; unknown ids are ignored
    pub async fn remove(&self, id: i32) {
        if let Some(connection) = self.state.registry.remove(id).await {
            connection.cancel.cancel();
            connection.sink.close().await;
            tracing::info!(
                "Client {} ({}) removed and connection closed",
                id,
                connection.name.as_deref().unwrap_or("unnamed")
            );
        }
    }

    /// Send `"<name>: <body>"` to every named connection.
    ///
    /// Returns the number of recipients the message was written to. A failed
    /// write is logged and does not stop delivery to the others.
    pub async fn broadcast(&self, message: &Message) -> usize {
        let registered = self.state.registry.name_of(message.sender_id).await;
        let sender_name = resolve_sender_name(message.sender_id, registered);
        let outgoing = format_broadcast(message, &sender_name);

        let recipients = self.state.registry.named_recipients().await;
        deliver(&recipients, &outgoing).await
    }

    /// Named participants sorted by id
    pub async fn participants(&self) -> Vec<Participant> {
        self.state.registry.participants().await
    }
}

/// Write `message` to each recipient, tolerating individual failures
async fn deliver(recipients: &[Recipient], message: &Message) -> usize {
    let mut delivered = 0;
    for recipient in recipients {
        match recipient.sink.send(message.clone()).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                "Failed to send message to client {} ({}): {}",
                recipient.id,
                recipient.name.as_deref().unwrap_or("unnamed"),
                e
            ),
        }
    }
    tracing::debug!(
        "Delivered '{}' to {}/{} clients",
        message.payload,
        delivered,
        recipients.len()
    );
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use crate::sink::{MessageSink, MockMessageSink};
    use parlor_shared::{MessageType, ProtocolError};

    /// Sink that records every message it is asked to send
    fn recording_sink(received: Arc<StdMutex<Vec<Message>>>) -> MockMessageSink {
        let mut sink = MockMessageSink::new();
        sink.expect_send().returning(move |message| {
            received.lock().unwrap().push(message);
            Ok(())
        });
        sink.expect_close().returning(|| ());
        sink
    }

    fn failing_sink() -> MockMessageSink {
        let mut sink = MockMessageSink::new();
        sink.expect_send().returning(|_| {
            Err(ProtocolError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            )))
        });
        sink.expect_close().returning(|| ());
        sink
    }

    async fn register(
        server: &ChatServer,
        name: Option<&str>,
        sink: MockMessageSink,
    ) -> (i32, CancellationToken) {
        let id = server.registry().allocate_id();
        let token = server.child_token();
        let sink: Arc<dyn MessageSink> = Arc::new(sink);
        server.registry().register(id, sink, token.clone()).await;
        if let Some(name) = name {
            server.registry().set_name(id, name.to_string()).await;
        }
        (id, token)
    }

    #[tokio::test]
    async fn test_broadcast_formats_and_reaches_named_clients() {
        // テスト項目: 送信者名を付けた本文が名前付きの全接続に届く
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let alice_inbox = Arc::new(StdMutex::new(Vec::new()));
        let bob_inbox = Arc::new(StdMutex::new(Vec::new()));
        let (alice, _) = register(&server, Some("A"), recording_sink(alice_inbox.clone())).await;
        register(&server, Some("B"), recording_sink(bob_inbox.clone())).await;

        // when (操作):
        let delivered = server.broadcast(&Message::text(alice, "hello")).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        let expected = Message::text(alice, "A: hello");
        assert_eq!(*alice_inbox.lock().unwrap(), vec![expected.clone()]);
        assert_eq!(*bob_inbox.lock().unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn test_broadcast_skips_unnamed_connections() {
        // テスト項目: 名前未設定の接続にはブロードキャストされない
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let named_inbox = Arc::new(StdMutex::new(Vec::new()));
        let pending_inbox = Arc::new(StdMutex::new(Vec::new()));
        let (alice, _) = register(&server, Some("alice"), recording_sink(named_inbox.clone())).await;
        register(&server, None, recording_sink(pending_inbox.clone())).await;

        // when (操作):
        let delivered = server.broadcast(&Message::text(alice, "hi")).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(named_inbox.lock().unwrap().len(), 1);
        assert!(pending_inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_continues_after_write_failure() {
        // テスト項目: 一部の送信失敗があっても残りのクライアントには届く
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let inbox = Arc::new(StdMutex::new(Vec::new()));
        let (alice, _) = register(&server, Some("alice"), failing_sink()).await;
        register(&server, Some("bob"), recording_sink(inbox.clone())).await;

        // when (操作):
        let delivered = server.broadcast(&Message::text(alice, "still here")).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(
            *inbox.lock().unwrap(),
            vec![Message::text(alice, "alice: still here")]
        );
    }

    #[tokio::test]
    async fn test_broadcast_from_server_uses_system_name() {
        // テスト項目: サーバー ID (-1) からのメッセージは system 名で整形される
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let inbox = Arc::new(StdMutex::new(Vec::new()));
        register(&server, Some("alice"), recording_sink(inbox.clone())).await;

        // when (操作):
        server
            .broadcast(&Message::text(parlor_shared::SERVER_ID, "maintenance"))
            .await;

        // then (期待する結果):
        assert_eq!(inbox.lock().unwrap()[0].payload, "system: maintenance");
    }

    #[tokio::test]
    async fn test_remove_closes_and_cancels() {
        // テスト項目: remove で接続が閉じられ、ディスパッチャが停止する
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let mut sink = MockMessageSink::new();
        sink.expect_close().times(1).returning(|| ());
        let (id, token) = register(&server, Some("alice"), sink).await;

        // when (操作):
        server.remove(id).await;
        server.remove(id).await;

        // then (期待する結果):
        assert!(token.is_cancelled());
        assert!(server.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_ignored() {
        // テスト項目: 存在しない ID の remove は何もしない
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());

        // when (操作):
        server.remove(42).await;

        // then (期待する結果):
        assert!(server.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_shutdown_notifies_every_client_once() {
        // テスト項目: shutdown で全接続に SHUTDOWN が 1 回だけ送られ、登録が空になる
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::default());
        let named_inbox = Arc::new(StdMutex::new(Vec::new()));
        let pending_inbox = Arc::new(StdMutex::new(Vec::new()));
        let (_, named_token) =
            register(&server, Some("alice"), recording_sink(named_inbox.clone())).await;
        let (_, pending_token) =
            register(&server, None, recording_sink(pending_inbox.clone())).await;

        // when (操作):
        server.shutdown().await;
        server.shutdown().await;

        // then (期待する結果):
        assert!(!server.is_alive());
        assert!(server.registry().is_empty().await);
        assert!(named_token.is_cancelled() && pending_token.is_cancelled());
        for inbox in [named_inbox, pending_inbox] {
            let received = inbox.lock().unwrap();
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].r#type, MessageType::Shutdown);
            assert_eq!(received[0].payload, "system: Server is shutting down...");
        }
    }

    #[tokio::test]
    async fn test_serve_returns_after_shutdown() {
        // テスト項目: shutdown 後に待ち受けループが終了する
        // given (前提条件):
        let server = ChatServer::new(ServerConfig::new("127.0.0.1", 0));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let runner = server.clone();
        let handle = tokio::spawn(async move { runner.serve(listener).await });

        // when (操作):
        server.shutdown().await;

        // then (期待する結果):
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("listener should stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
