//! Websocket feed for live stock events

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use tokio::sync::broadcast;

use crate::events::StockEvent;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Upgrade to a websocket and relay stock events until the client leaves
pub async fn ws_feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    upgrade: WebSocketUpgrade,
) -> Response {
    let rx = state.events.subscribe();
    tracing::debug!(email = %user.email, "websocket subscriber connected");
    upgrade.on_upgrade(move |socket| stream_events(socket, rx))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<StockEvent>) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(err) => {
                            tracing::warn!("Event serialization failed: {:?}", err);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // A lagging client misses events; the REST endpoints stay
                // authoritative, so keep the connection.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "websocket subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
