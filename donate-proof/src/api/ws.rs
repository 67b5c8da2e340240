//! WebSocket listener for a proof session
//!
//! The viewer (typically the laptop showing the session QR code) connects
//! and receives one JSON text frame per accepted upload. The connection is
//! registered with the hub for as long as the socket stays open; anything
//! the viewer sends is ignored.

use crate::hub::{NotificationHub, Subscription};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Interval between keep-alive pings on idle connections
pub const WS_PING_INTERVAL: Duration = Duration::from_secs(30);

/// GET /ws/proof/:session_id
pub async fn proof_websocket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub, session_id))
}

async fn handle_socket(socket: WebSocket, hub: Arc<NotificationHub>, session_id: Uuid) {
    let subscription = hub.subscribe(session_id);
    info!(session_id = %session_id, "Proof viewer connected");

    forward_events(socket, subscription).await;

    info!(session_id = %session_id, "Proof viewer disconnected");
}

/// Pump hub events to the socket until either side goes away
///
/// Dropping `subscription` on return unregisters the viewer.
async fn forward_events(socket: WebSocket, mut subscription: Subscription) {
    let session_id = subscription.session_id();
    let (mut sender, mut receiver) = socket.split();
    let mut ping = tokio::time::interval(WS_PING_INTERVAL);
    ping.reset();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let json = match event.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(session_id = %session_id, "Failed to serialize proof event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(json)).await {
                    debug!(session_id = %session_id, "WebSocket send failed: {}", e);
                    break;
                }
            }
            _ = ping.tick() => {
                if let Err(e) = sender.send(Message::Ping(Vec::new())).await {
                    debug!(session_id = %session_id, "WebSocket ping failed: {}", e);
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(session_id = %session_id, "WebSocket read failed: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
