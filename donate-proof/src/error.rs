//! Error types for donate-proof
//!
//! [`ProofError`] is what the validation engine returns; [`ApiError`] maps it
//! (and request-level problems) onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Proof validation errors
///
/// A duplicate upload is not an error; see `UploadOutcome::is_duplicate`.
#[derive(Error, Debug)]
pub enum ProofError {
    /// Unknown or inactive session
    #[error("Proof session not found: {0}")]
    SessionNotFound(Uuid),

    /// Zero-length image payload
    #[error("Empty image")]
    EmptyImage,

    /// Persistence collaborator failed
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: donate_common::Error,
    },
}

impl ProofError {
    pub fn storage(operation: &'static str, source: donate_common::Error) -> Self {
        ProofError::Storage { operation, source }
    }
}

/// Convenience Result type using [`ProofError`]
pub type Result<T> = std::result::Result<T, ProofError>;

/// HTTP-facing error
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// Malformed request (missing field, bad multipart body, ...)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid organization identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Failure outside the engine (file storage, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Proof(ProofError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Proof(ProofError::EmptyImage) => StatusCode::BAD_REQUEST,
            ApiError::Proof(ProofError::Storage { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
