//! Proof validation engine
//!
//! Decides whether an uploaded photo is a new, plausible proof that a cause
//! was executed, and records it with a 0-100 metadata score:
//!
//! | Check                          | Points |
//! |--------------------------------|--------|
//! | Captured inside the time window | 40    |
//! | Captured inside the geofence    | 40    |
//! | Not a duplicate in the session  | 20    |
//!
//! A cause with no window (or no geofence) passes that check. Duplicates
//! score 0 and are not stored.

use crate::error::{ProofError, Result};
use crate::repository::{CauseExecutionLookup, ProofImageRepository, ProofSessionRepository};
use chrono::{DateTime, Utc};
use donate_common::db::{CauseExecution, ProofImage, ProofSession};
use donate_common::hashing::content_hash;
use donate_common::GeoPoint;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub const SCORE_TIME_VALID: i64 = 40;
pub const SCORE_LOCATION_VALID: i64 = 40;
pub const SCORE_UNIQUE: i64 = 20;

/// Result of checking a submission against a cause's execution constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub time_valid: bool,
    pub location_valid: bool,
    pub score: i64,
}

impl Assessment {
    pub fn validation_ok(&self) -> bool {
        self.time_valid && self.location_valid
    }
}

/// Score a non-duplicate submission
///
/// `execution` is `None` when the cause has no execution record, which is
/// treated as fully unconstrained.
pub fn assess(
    execution: Option<&CauseExecution>,
    location: GeoPoint,
    captured_at: DateTime<Utc>,
) -> Assessment {
    let time_valid = execution
        .and_then(CauseExecution::window)
        .map_or(true, |window| window.contains(captured_at));
    let location_valid = execution
        .and_then(CauseExecution::geofence)
        .map_or(true, |fence| fence.contains(location));

    let mut score = SCORE_UNIQUE;
    if time_valid {
        score += SCORE_TIME_VALID;
    }
    if location_valid {
        score += SCORE_LOCATION_VALID;
    }

    Assessment {
        time_valid,
        location_valid,
        score,
    }
}

/// Outcome of [`ProofService::process_upload`]
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Stored record; `None` for duplicates
    pub image: Option<ProofImage>,
    pub score: i64,
    pub is_duplicate: bool,
    pub validation_ok: bool,
}

impl UploadOutcome {
    fn duplicate() -> Self {
        Self {
            image: None,
            score: 0,
            is_duplicate: true,
            validation_ok: false,
        }
    }
}

/// Proof session creation and upload validation
pub struct ProofService {
    sessions: Arc<dyn ProofSessionRepository>,
    images: Arc<dyn ProofImageRepository>,
    causes: Arc<dyn CauseExecutionLookup>,
}

impl ProofService {
    pub fn new(
        sessions: Arc<dyn ProofSessionRepository>,
        images: Arc<dyn ProofImageRepository>,
        causes: Arc<dyn CauseExecutionLookup>,
    ) -> Self {
        Self {
            sessions,
            images,
            causes,
        }
    }

    /// Open a new active session for `cause_id` on behalf of `organization_id`
    ///
    /// Any number of sessions may be open for the same cause.
    pub async fn create_session(
        &self,
        cause_id: Uuid,
        organization_id: Uuid,
    ) -> Result<ProofSession> {
        let session = ProofSession::open(cause_id, organization_id, donate_common::time::now());

        self.sessions
            .create(&session)
            .await
            .map_err(|e| ProofError::storage("create proof session", e))?;

        info!(
            session_id = %session.id,
            cause_id = %cause_id,
            organization_id = %organization_id,
            "Proof session created"
        );
        Ok(session)
    }

    /// Validate, score and record an uploaded image
    ///
    /// The duplicate check and the insert are separate round trips, so two
    /// identical images racing into the same session can both be stored.
    pub async fn process_upload(
        &self,
        session_id: Uuid,
        latitude: f64,
        longitude: f64,
        captured_at: DateTime<Utc>,
        image_bytes: &[u8],
    ) -> Result<UploadOutcome> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await
            .map_err(|e| ProofError::storage("lookup proof session", e))?
            .filter(|s| s.is_active)
            .ok_or(ProofError::SessionNotFound(session_id))?;

        if image_bytes.is_empty() {
            return Err(ProofError::EmptyImage);
        }

        let image_hash = content_hash(image_bytes);

        let exists = self
            .images
            .exists_by_hash(session_id, &image_hash)
            .await
            .map_err(|e| ProofError::storage("check duplicate image", e))?;
        if exists {
            info!(session_id = %session_id, hash = %image_hash, "Duplicate proof image ignored");
            return Ok(UploadOutcome::duplicate());
        }

        let execution = self
            .causes
            .get_execution(session.cause_id)
            .await
            .map_err(|e| ProofError::storage("fetch cause execution", e))?;

        let assessment = assess(
            execution.as_ref(),
            GeoPoint::new(latitude, longitude),
            captured_at,
        );
        debug!(
            session_id = %session_id,
            cause_id = %session.cause_id,
            constrained = execution.is_some(),
            time_valid = assessment.time_valid,
            location_valid = assessment.location_valid,
            "Assessed proof image"
        );

        let image = ProofImage {
            id: Uuid::new_v4(),
            session_id,
            image_hash,
            latitude: Some(latitude),
            longitude: Some(longitude),
            timestamp: Some(captured_at),
            metadata_score: assessment.score,
            created_at: donate_common::time::now(),
        };

        self.images
            .create(&image)
            .await
            .map_err(|e| ProofError::storage("store proof image", e))?;

        info!(
            session_id = %session_id,
            image_id = %image.id,
            score = assessment.score,
            validation_ok = assessment.validation_ok(),
            "Proof image stored"
        );

        Ok(UploadOutcome {
            score: assessment.score,
            is_duplicate: false,
            validation_ok: assessment.validation_ok(),
            image: Some(image),
        })
    }

    /// Withdraw a stored image whose upload could not be completed
    ///
    /// A later upload of the same bytes to the session is then accepted as
    /// new instead of being reported as a duplicate.
    pub async fn discard_image(&self, image: &ProofImage) -> Result<()> {
        self.images
            .delete(image.id)
            .await
            .map_err(|e| ProofError::storage("discard proof image", e))?;

        info!(
            session_id = %image.session_id,
            image_id = %image.id,
            "Proof image discarded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window_exec() -> (CauseExecution, DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 4, 10, 18, 0, 0).unwrap();
        let exec = CauseExecution::unconstrained(Uuid::new_v4()).with_window(start, end);
        (exec, start, end)
    }

    #[test]
    fn test_no_execution_record_scores_full() {
        let a = assess(None, GeoPoint::new(10.0, 20.0), Utc::now());
        assert_eq!(
            a,
            Assessment {
                time_valid: true,
                location_valid: true,
                score: 100
            }
        );
        assert!(a.validation_ok());
    }

    #[test]
    fn test_empty_execution_record_scores_full() {
        let exec = CauseExecution::unconstrained(Uuid::new_v4());
        let a = assess(Some(&exec), GeoPoint::new(0.0, 0.0), Utc::now());
        assert_eq!(a.score, 100);
    }

    #[test]
    fn test_time_window_boundaries() {
        let (exec, start, end) = window_exec();
        let here = GeoPoint::new(0.0, 0.0);

        assert!(assess(Some(&exec), here, start).time_valid);
        assert!(assess(Some(&exec), here, end).time_valid);
        assert!(!assess(Some(&exec), here, start - Duration::seconds(1)).time_valid);
        assert!(!assess(Some(&exec), here, end + Duration::seconds(1)).time_valid);
    }

    #[test]
    fn test_outside_window_loses_time_points() {
        let (exec, _, end) = window_exec();
        let a = assess(Some(&exec), GeoPoint::new(0.0, 0.0), end + Duration::hours(1));
        assert_eq!(a.score, SCORE_LOCATION_VALID + SCORE_UNIQUE);
        assert!(!a.validation_ok());
    }

    #[test]
    fn test_outside_geofence_loses_location_points() {
        let exec = CauseExecution::unconstrained(Uuid::new_v4()).with_geofence(0.0, 0.0, 200.0);

        let inside = assess(Some(&exec), GeoPoint::new(0.0, 0.00175), Utc::now());
        assert!(inside.location_valid);
        assert_eq!(inside.score, 100);

        let outside = assess(Some(&exec), GeoPoint::new(0.0, 0.002), Utc::now());
        assert!(!outside.location_valid);
        assert_eq!(outside.score, SCORE_TIME_VALID + SCORE_UNIQUE);
    }

    #[test]
    fn test_both_constraints_failed_keeps_uniqueness_bonus() {
        let (exec, start, _) = window_exec();
        let exec = exec.with_geofence(0.0, 0.0, 50.0);
        let a = assess(Some(&exec), GeoPoint::new(1.0, 1.0), start - Duration::days(1));
        assert_eq!(a.score, SCORE_UNIQUE);
    }

    #[test]
    fn test_relaxing_constraints_never_lowers_score() {
        let (windowed, start, _) = window_exec();
        let full = windowed.clone().with_geofence(0.0, 0.0, 100.0);

        let submissions = [
            (GeoPoint::new(0.0, 0.0), start),
            (GeoPoint::new(0.0, 0.0), start - Duration::hours(3)),
            (GeoPoint::new(0.5, 0.5), start),
            (GeoPoint::new(0.5, 0.5), start - Duration::hours(3)),
        ];

        for (point, at) in submissions {
            let both = assess(Some(&full), point, at).score;

            let mut no_fence = full.clone();
            no_fence.execution_radius_meters = None;
            let mut no_window = full.clone();
            no_window.execution_end_time = None;

            assert!(assess(Some(&no_fence), point, at).score >= both);
            assert!(assess(Some(&no_window), point, at).score >= both);
            assert_eq!(assess(None, point, at).score, 100);
        }
    }
}
