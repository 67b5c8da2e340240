//! Liveness probe for the proof service
//!
//! Reports only that the process is serving requests; the database and the
//! uploads folder are not touched.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate name, so a gateway fronting several services can tell them apart
    pub module: &'static str,
    pub version: &'static str,
}

/// GET /health
///
/// Open to any caller; no `X-Organization-Id` is required.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `/health` route, merged into the main router alongside the proof routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
