//! Peer connection plumbing.
//!
//! Inbound peers arrive as WebSocket upgrades on the shared HTTP server;
//! outbound peers are dialed with `tokio-tungstenite`. Both run the same
//! lifecycle: register with the engine (which fires the connect-time
//! protocol), pump the outbox through a dedicated writer task so sends stay
//! in order, dispatch inbound text frames, and tear down idempotently on
//! close or transport error.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::engine::SyncEngine;
use crate::error::NodeError;

/// Router exposing the peer WebSocket endpoint, mounted on the same server
/// as the HTTP surface.
pub fn peer_router(engine: Arc<SyncEngine>) -> Router {
    Router::new()
        .route("/peer", get(upgrade_handler))
        .with_state(engine)
}

async fn upgrade_handler(
    ws: WebSocketUpgrade,
    State(engine): State<Arc<SyncEngine>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_inbound(socket, engine))
}

/// Drive an accepted peer connection until it closes or errors.
async fn serve_inbound(socket: WebSocket, engine: Arc<SyncEngine>) {
    let (peer_id, mut outbox) = engine.register_peer().await;
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = stream.next().await {
        match received {
            Ok(WsMessage::Text(text)) => engine.handle_message(peer_id, &text).await,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(peer = peer_id, error = %e, "peer transport error");
                break;
            }
        }
    }

    engine.remove_peer(peer_id).await;
    writer.abort();
}

/// Dial a peer WebSocket URL and hand the connection to the engine. The
/// connection then behaves identically to an accepted one.
pub async fn connect(url: &str, engine: Arc<SyncEngine>) -> Result<(), NodeError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| NodeError::Peer(format!("failed to connect to {url}: {e}")))?;
    tracing::info!(%url, "connected to peer");
    tokio::spawn(serve_outbound(socket, engine));
    Ok(())
}

/// Drive a dialed peer connection until it closes or errors.
async fn serve_outbound(socket: WebSocketStream<MaybeTlsStream<TcpStream>>, engine: Arc<SyncEngine>) {
    let (peer_id, mut outbox) = engine.register_peer().await;
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sink.send(TungsteniteMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = stream.next().await {
        match received {
            Ok(TungsteniteMessage::Text(text)) => engine.handle_message(peer_id, &text).await,
            Ok(TungsteniteMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(peer = peer_id, error = %e, "peer transport error");
                break;
            }
        }
    }

    engine.remove_peer(peer_id).await;
    writer.abort();
}
