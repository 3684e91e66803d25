//! Per-connection dispatcher.
//!
//! One task per accepted connection: it sends the assigned id, waits for the
//! login name, then relays every inbound message until logout, read error or
//! shutdown. The connection is removed from the registry on every exit path.

use std::{net::SocketAddr, sync::Arc};

use futures_util::StreamExt;
use parlor_shared::{Message, MessageCodec, ProtocolError, write_client_id};
use tokio::net::{TcpStream, tcp::OwnedReadHalf};
use tokio_util::{codec::FramedRead, sync::CancellationToken};

use crate::{
    domain::{DispatcherState, InboundAction, classify_inbound},
    server::ChatServer,
    sink::FramedMessageSink,
};

type MessageReader = FramedRead<OwnedReadHalf, MessageCodec>;

/// Why the read loop stopped
enum ReadOutcome {
    Message(Message),
    Closed,
    Cancelled,
    Failed(ProtocolError),
}

/// Drive one client connection from accept to close
pub(crate) async fn handle_connection(server: ChatServer, mut stream: TcpStream, peer: SocketAddr) {
    let id = server.registry().allocate_id();
    let mut state = DispatcherState::Accepted;

    if let Err(e) = write_client_id(&mut stream, id).await {
        tracing::warn!("Failed to send id {} to {}: {}", id, peer, e);
        return;
    }
    tracing::debug!("Client {} at {}: {}", id, peer, state);

    let (read_half, write_half) = stream.into_split();
    let cancel = server.child_token();
    server
        .registry()
        .register(id, Arc::new(FramedMessageSink::new(write_half)), cancel.clone())
        .await;

    let mut reader = FramedRead::new(read_half, MessageCodec::new());
    if server.is_alive() {
        dispatch(&server, id, &mut reader, &cancel, &mut state).await;
    }

    server.remove(id).await;
    state = DispatcherState::Closed;
    tracing::debug!("Client {} at {}: {}", id, peer, state);
}

/// Name handshake followed by the active read loop
async fn dispatch(
    server: &ChatServer,
    id: i32,
    reader: &mut MessageReader,
    cancel: &CancellationToken,
    state: &mut DispatcherState,
) {
    *state = DispatcherState::AwaitingName;
    tracing::debug!("Client {}: {}", id, state);

    let username = match next_message(reader, cancel).await {
        ReadOutcome::Message(first) => first.payload,
        outcome => {
            report(server, id, None, outcome);
            return;
        }
    };
    if !server.registry().set_name(id, username.clone()).await {
        return;
    }
    *state = DispatcherState::Active;
    tracing::info!("Client {} connected as '{}'", id, username);

    loop {
        let message = match next_message(reader, cancel).await {
            ReadOutcome::Message(message) => message,
            outcome => {
                report(server, id, Some(&username), outcome);
                return;
            }
        };

        match classify_inbound(&message, server.is_alive()) {
            InboundAction::Close => {
                tracing::info!("Client '{}' logged out", username);
                return;
            }
            InboundAction::LogNotice => {
                tracing::info!("{}", message.payload);
            }
            InboundAction::Broadcast => {
                tracing::info!("{}: {}", username, message.payload);
                // The sender id on the wire is only trusted from the registry.
                let message = Message::new(id, message.r#type, message.payload);
                server.broadcast(&message).await;
            }
        }
    }
}

async fn next_message(reader: &mut MessageReader, cancel: &CancellationToken) -> ReadOutcome {
    tokio::select! {
        _ = cancel.cancelled() => ReadOutcome::Cancelled,
        frame = reader.next() => match frame {
            Some(Ok(message)) => ReadOutcome::Message(message),
            Some(Err(e)) => ReadOutcome::Failed(e),
            None => ReadOutcome::Closed,
        },
    }
}

/// Log why a connection left the read loop
fn report(server: &ChatServer, id: i32, username: Option<&str>, outcome: ReadOutcome) {
    let who = username.unwrap_or("unnamed");
    match outcome {
        ReadOutcome::Failed(e) if server.is_alive() => {
            tracing::error!("Communication error with client {} ({}): {}", id, who, e);
        }
        ReadOutcome::Closed if server.is_alive() => {
            tracing::info!("Client {} ({}) closed the connection", id, who);
        }
        _ => tracing::debug!("Client {} ({}) stopped", id, who),
    }
}
