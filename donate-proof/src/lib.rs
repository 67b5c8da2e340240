//! donate-proof library - proof-of-work validation service
//!
//! Field workers upload photos as proof that a funded cause was carried out.
//! Each upload is de-duplicated per session, scored against the cause's
//! execution window and geofence, recorded, and pushed live to whoever is
//! watching the session.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod repository;
pub mod storage;
pub mod validation;

use config::Config;
use hub::NotificationHub;
use repository::{SqliteCauseExecutionLookup, SqliteProofImageRepository, SqliteProofSessionRepository};
use storage::ImageStorage;
use validation::ProofService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProofService>,
    pub hub: Arc<NotificationHub>,
    pub storage: Arc<ImageStorage>,
    /// Advisory session lifetime reported to clients
    pub session_ttl_minutes: u32,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        service: Arc<ProofService>,
        hub: Arc<NotificationHub>,
        storage: Arc<ImageStorage>,
        session_ttl_minutes: u32,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            service,
            hub,
            storage,
            session_ttl_minutes,
            max_upload_bytes,
        }
    }

    /// Wire the SQLite repositories, hub and image storage from `config`
    pub fn from_pool(db: SqlitePool, config: &Config) -> Self {
        let service = ProofService::new(
            Arc::new(SqliteProofSessionRepository::new(db.clone())),
            Arc::new(SqliteProofImageRepository::new(db.clone())),
            Arc::new(SqliteCauseExecutionLookup::new(db)),
        );

        Self::new(
            Arc::new(service),
            NotificationHub::new(config.listener_buffer),
            Arc::new(ImageStorage::new(config.uploads_dir.clone())),
            config.session_ttl_minutes,
            config.max_upload_bytes,
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/api/proof/session", post(api::create_session))
        .route("/api/proof/upload/:session_id", post(api::upload_proof))
        .route("/api/proof/:session_id/events", get(api::proof_event_stream))
        .route("/ws/proof/:session_id", get(api::proof_websocket))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
