//! Server-Sent Events listener for a proof session
//!
//! Alternative to the WebSocket listener for viewers behind proxies that
//! strip upgrades. Same events, same hub.

use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use uuid::Uuid;

/// GET /api/proof/:session_id/events
pub async fn proof_event_stream(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe(session_id);
    donate_common::sse::create_proof_sse_stream(subscription, session_id.to_string())
}
