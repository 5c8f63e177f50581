//! Axum websocket adapter.
//!
//! Bridges an upgraded socket to the registry. Each connection gets:
//! - a [`WsTransport`] registered with the registry, which only enqueues onto
//!   an unbounded channel (registry work never blocks on socket I/O);
//! - a writer task draining that channel into the socket in FIFO order;
//! - a reader loop applying client frames and pongs under the registry lock.
//!
//! The reader loop ends on client close, socket error, or forced termination,
//! and removes the connection from the registry on its way out.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use gateway_types::{ClientMessage, ConnectionId, PayloadError, Transport, TransportError};
use tokio::sync::{mpsc, Notify};

use crate::registry::ConnectionRegistry;
use crate::SharedRegistry;

enum Outbound {
    Frame(String),
    Ping,
    Close,
}

/// [`Transport`] over an upgraded axum websocket.
pub struct WsTransport {
    tx: mpsc::UnboundedSender<Outbound>,
    terminated: Arc<Notify>,
}

impl Transport for WsTransport {
    fn send(&self, frame: &str) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Frame(frame.to_string()))
            .map_err(|_| TransportError::Closed)
    }

    fn ping(&self) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Ping)
            .map_err(|_| TransportError::Closed)
    }

    fn terminate(&self) {
        let _ = self.tx.send(Outbound::Close);
        self.terminated.notify_one();
    }
}

/// Axum handler that upgrades an HTTP request to a notification connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(registry): State<SharedRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, peer))
}

/// Drive a single connection until it closes.
pub async fn handle_socket(socket: WebSocket, registry: SharedRegistry, peer: SocketAddr) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let terminated = Arc::new(Notify::new());
    let transport = Arc::new(WsTransport {
        tx,
        terminated: terminated.clone(),
    });

    let id = registry.lock().await.register(transport);
    tracing::info!(connection = %id, peer = %peer, "new notification connection");

    // Ends when the registry drops the transport (closing the channel) or
    // after a forced close frame.
    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let msg = match out {
                Outbound::Frame(text) => Message::Text(text),
                Outbound::Ping => Message::Ping(Vec::new()),
                Outbound::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if let Err(e) = sink.send(msg).await {
                tracing::debug!(connection = %id, error = %e, "socket write failed");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = terminated.notified() => break,
            next = stream.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    let mut reg = registry.lock().await;
                    if let Err(e) = apply_client_frame(&mut reg, id, &text) {
                        tracing::warn!(connection = %id, error = %e, "bad client message, ignoring");
                    }
                }
                Some(Ok(Message::Pong(_))) => registry.lock().await.mark_alive(id),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = close_details(frame.as_ref());
                    tracing::info!(connection = %id, code, reason = %reason, "connection closed by client");
                    break;
                }
                // Pings are answered by axum itself; binary frames carry nothing we read.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(connection = %id, error = %e, "socket read failed");
                    break;
                }
                None => break,
            },
        }
    }

    registry.lock().await.remove_connection(id);
}

/// Apply one text frame from connection `id`. Unparsable frames leave the
/// connection and its subscriptions untouched.
pub fn apply_client_frame(
    registry: &mut ConnectionRegistry,
    id: ConnectionId,
    text: &str,
) -> Result<(), PayloadError> {
    tracing::debug!(connection = %id, frame = text, "received client frame");
    match ClientMessage::parse(text)? {
        ClientMessage::Subscribe(accounts) => {
            let added = registry.subscribe(id, accounts);
            tracing::debug!(connection = %id, added, "subscribed");
        }
        ClientMessage::Unsubscribe(accounts) => {
            let removed = registry.unsubscribe(id, accounts);
            tracing::debug!(connection = %id, removed, "unsubscribed");
        }
    }
    Ok(())
}

fn close_details(frame: Option<&CloseFrame<'static>>) -> (u16, String) {
    frame
        .map(|f| (f.code, f.reason.to_string()))
        .unwrap_or((1005, String::new()))
}
