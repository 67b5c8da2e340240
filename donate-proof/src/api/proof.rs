//! Proof session and upload endpoints

use crate::api::context::OrganizationId;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use donate_common::time::{parse_capture_time, session_expiry};
use donate_common::ProofUploadEvent;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub cause_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    /// Advisory; uploads are not rejected after this time
    pub expires_at: DateTime<Utc>,
    /// Value to encode in the QR code shown to the field worker
    pub qr_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub status: String,
    pub score: i64,
    pub is_duplicate: bool,
    pub validation_ok: bool,
}

/// Fields of the multipart upload form
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    image: Option<Vec<u8>>,
    lat: String,
    lng: String,
    timestamp: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid form: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;
                    form.image = Some(bytes.to_vec());
                }
                "lat" | "lng" | "timestamp" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Invalid {} field: {}", name, e)))?;
                    match name.as_str() {
                        "lat" => form.lat = value,
                        "lng" => form.lng = value,
                        _ => form.timestamp = Some(value),
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Missing or unparseable coordinates become 0.0
fn parse_coordinate(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/proof/session
///
/// Opens a proof session for a cause on behalf of the calling organization.
pub async fn create_session(
    State(state): State<AppState>,
    OrganizationId(organization_id): OrganizationId,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let cause_id = req
        .cause_id
        .ok_or_else(|| ApiError::BadRequest("causeId is required".to_string()))?;

    let session = state.service.create_session(cause_id, organization_id).await?;

    Ok(Json(SessionResponse {
        session_id: session.id,
        expires_at: session_expiry(session.created_at, state.session_ttl_minutes),
        qr_url: session.id.to_string(),
    }))
}

/// POST /api/proof/upload/:session_id
///
/// Multipart form: `file` (required), `lat`, `lng`, `timestamp` (RFC 3339).
/// Accepted (non-duplicate) images are written to disk and pushed to the
/// session's live viewers whether or not they passed validation.
pub async fn upload_proof(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let image = form
        .image
        .ok_or_else(|| ApiError::BadRequest("Image required".to_string()))?;

    if form.lat.is_empty() || form.lng.is_empty() {
        warn!(session_id = %session_id, lat = %form.lat, lng = %form.lng, "Upload without location");
    } else {
        info!(session_id = %session_id, lat = %form.lat, lng = %form.lng, "Upload with location");
    }

    let captured_at = parse_capture_time(form.timestamp.as_deref(), donate_common::time::now());

    let outcome = state
        .service
        .process_upload(
            session_id,
            parse_coordinate(&form.lat),
            parse_coordinate(&form.lng),
            captured_at,
            &image,
        )
        .await?;

    // Duplicates carry no record and are neither stored on disk nor announced
    if let Some(record) = outcome.image.as_ref() {
        let saved = state
            .storage
            .save(session_id, &record.image_hash, form.file_name.as_deref(), &image)
            .await;

        let image_path = match saved {
            Ok(path) => path,
            Err(e) => {
                error!(session_id = %session_id, image_id = %record.id, "Failed to save proof image: {}", e);
                // Without the record a retry of the same bytes is processed again
                if let Err(discard) = state.service.discard_image(record).await {
                    error!(image_id = %record.id, "Failed to discard unsaved proof image: {}", discard);
                }
                return Err(ApiError::Internal("Failed to save file".to_string()));
            }
        };

        state.hub.publish(
            session_id,
            ProofUploadEvent::new(image_path, form.lat, form.lng, captured_at),
        );
    }

    Ok(Json(UploadResponse {
        status: "uploaded".to_string(),
        score: outcome.score,
        is_duplicate: outcome.is_duplicate,
        validation_ok: outcome.validation_ok,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("12.9716"), 12.9716);
        assert_eq!(parse_coordinate(" -0.5 "), -0.5);
        assert_eq!(parse_coordinate(""), 0.0);
        assert_eq!(parse_coordinate("north"), 0.0);
    }
}
