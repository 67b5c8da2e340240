//! Server-Sent Events (SSE) utilities
//!
//! Turns a stream of [`ProofUploadEvent`]s into an SSE response for viewers
//! that cannot open a WebSocket.

use crate::events::{ProofUploadEvent, PROOF_UPLOADED_EVENT};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keep-alive interval for idle SSE connections
pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Create an SSE stream that forwards proof upload events
///
/// Sends a `ConnectionStatus: connected` event first, then one
/// `ProofUploaded` event per item. The stream ends when `events` ends.
///
/// # Arguments
/// * `events` - Upload events for a single proof session
/// * `label` - Identifies the connection in logs (e.g. the session id)
pub fn create_proof_sse_stream<S>(
    events: S,
    label: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = ProofUploadEvent> + Send + 'static,
{
    info!(session = %label, "New SSE client connected to proof events");

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            match event.to_json() {
                Ok(json) => {
                    debug!(session = %label, image = %event.image_path, "SSE: forwarding proof upload");
                    yield Ok(Event::default().event(PROOF_UPLOADED_EVENT).data(json));
                }
                Err(e) => warn!(session = %label, "Failed to serialize proof event: {}", e),
            }
        }

        debug!(session = %label, "SSE: proof event stream ended");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE).text("heartbeat"))
}
