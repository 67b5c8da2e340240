//! Database models

use crate::geo::{ExecutionWindow, GeoPoint, Geofence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Short-lived token binding a proof upload flow to one cause and one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofSession {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub cause_id: Uuid,
    /// Sessions are soft-disabled, never deleted
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProofSession {
    /// Open a new active session
    pub fn open(cause_id: Uuid, organization_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            cause_id,
            is_active: true,
            created_at,
        }
    }
}

/// An accepted (non-duplicate) proof image
///
/// Written once at upload time and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofImage {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Hex SHA-256 of the raw bytes; unique within a session
    pub image_hash: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Claimed capture time
    pub timestamp: Option<DateTime<Utc>>,
    /// 0-100
    pub metadata_score: i64,
    pub created_at: DateTime<Utc>,
}

/// Read-only projection of a cause's execution constraints
///
/// Missing pieces mean "unconstrained": a cause without a complete geofence
/// accepts any location, a cause without both window bounds accepts any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CauseExecution {
    pub cause_id: Uuid,
    pub execution_lat: Option<f64>,
    pub execution_lng: Option<f64>,
    pub execution_radius_meters: Option<f64>,
    pub execution_start_time: Option<DateTime<Utc>>,
    pub execution_end_time: Option<DateTime<Utc>>,
}

impl CauseExecution {
    /// Unconstrained execution record for `cause_id`
    pub fn unconstrained(cause_id: Uuid) -> Self {
        Self {
            cause_id,
            ..Self::default()
        }
    }

    pub fn with_geofence(mut self, lat: f64, lng: f64, radius_meters: f64) -> Self {
        self.execution_lat = Some(lat);
        self.execution_lng = Some(lng);
        self.execution_radius_meters = Some(radius_meters);
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.execution_start_time = Some(start);
        self.execution_end_time = Some(end);
        self
    }

    /// Geofence, when center and radius are all configured
    pub fn geofence(&self) -> Option<Geofence> {
        match (
            self.execution_lat,
            self.execution_lng,
            self.execution_radius_meters,
        ) {
            (Some(lat), Some(lng), Some(radius)) => {
                Some(Geofence::new(GeoPoint::new(lat, lng), radius))
            }
            _ => None,
        }
    }

    /// Execution window, when both bounds are configured
    pub fn window(&self) -> Option<ExecutionWindow> {
        match (self.execution_start_time, self.execution_end_time) {
            (Some(start), Some(end)) => Some(ExecutionWindow::new(start, end)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_session_is_active_with_fresh_id() {
        let cause = Uuid::new_v4();
        let org = Uuid::new_v4();
        let a = ProofSession::open(cause, org, Utc::now());
        let b = ProofSession::open(cause, org, Utc::now());

        assert!(a.is_active);
        assert_eq!(a.cause_id, cause);
        assert_eq!(a.organization_id, org);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_partial_geofence_is_unconstrained() {
        let mut exec = CauseExecution::unconstrained(Uuid::new_v4());
        exec.execution_lat = Some(1.0);
        exec.execution_lng = Some(2.0);
        assert!(exec.geofence().is_none());

        let exec = exec.with_geofence(1.0, 2.0, 0.0);
        let fence = exec.geofence().unwrap();
        assert_eq!(fence.effective_radius(), 200.0);
    }

    #[test]
    fn test_partial_window_is_unconstrained() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut exec = CauseExecution::unconstrained(Uuid::new_v4());
        exec.execution_start_time = Some(start);
        assert!(exec.window().is_none());

        let end = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let exec = exec.with_window(start, end);
        assert_eq!(exec.window(), Some(ExecutionWindow::new(start, end)));
    }
}
