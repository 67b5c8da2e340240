//! Live proof upload events
//!
//! Delivered to every viewer subscribed to a proof session (WebSocket text
//! frames or SSE `ProofUploaded` events).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SSE event name used for [`ProofUploadEvent`]
pub const PROOF_UPLOADED_EVENT: &str = "ProofUploaded";

/// A proof image accepted into a session
///
/// Coordinates are forwarded exactly as the client submitted them, so a
/// missing location arrives as empty strings rather than `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofUploadEvent {
    /// Path of the stored image, relative to the uploads directory
    #[serde(rename = "image")]
    pub image_path: String,
    #[serde(rename = "lat")]
    pub latitude: String,
    #[serde(rename = "lng")]
    pub longitude: String,
    /// Claimed capture time
    pub timestamp: DateTime<Utc>,
}

impl ProofUploadEvent {
    pub fn new(
        image_path: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            timestamp,
        }
    }

    /// Serialize for a WebSocket text frame or SSE data line
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
