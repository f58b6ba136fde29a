//! Canteen WebSocket endpoint - live menu and inventory events
//!
//! GET /api/canteens/{canteen_id}/events/ws
//!
//! Protocol: server → client only. Each frame is one JSON-encoded
//! `MenuEvent`; clients send nothing but WebSocket control frames.
//! No replay: a client sees only events published while it is connected.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::core::ServerState;

/// GET /api/canteens/{canteen_id}/events/ws
pub async fn handle_events_ws(
    State(state): State<ServerState>,
    Path(canteen_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| events_session(socket, state, canteen_id))
}

async fn events_session(socket: WebSocket, state: ServerState, canteen_id: i64) {
    let (mut sink, mut stream) = socket.split();

    tracing::info!(canteen_id, "Canteen events WS connected");

    let mut hub_rx = state.hub.subscribe(canteen_id);

    let mut ping_interval = tokio::time::interval(Duration::from_secs(30));
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(canteen_id, error = %e, "Failed to serialize event");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // The store stays authoritative; a lagged client just
                        // misses ephemeral events and keeps receiving new ones.
                        tracing::warn!(canteen_id, lagged = n, "Events subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ignore client frames, pong included
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::info!(canteen_id, "Canteen events WS disconnected");
    drop(hub_rx);
    state.hub.prune(canteen_id);
}
