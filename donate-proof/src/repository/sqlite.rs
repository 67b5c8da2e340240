//! SQLite repositories
//!
//! All lookups bind their key as a query parameter; ids are stored as
//! hyphenated TEXT.

use super::{CauseExecutionLookup, ProofImageRepository, ProofSessionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use donate_common::db::{CauseExecution, ProofImage, ProofSession};
use donate_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::CorruptRecord(format!("{} = '{}': {}", column, value, e)))
}

type SessionRow = (String, String, String, bool, DateTime<Utc>);

type ImageRow = (
    String,
    String,
    String,
    Option<f64>,
    Option<f64>,
    Option<DateTime<Utc>>,
    i64,
    DateTime<Utc>,
);

type ExecutionRow = (
    String,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

/// Proof sessions in the `proof_sessions` table
#[derive(Clone)]
pub struct SqliteProofSessionRepository {
    db: SqlitePool,
}

impl SqliteProofSessionRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProofSessionRepository for SqliteProofSessionRepository {
    async fn create(&self, session: &ProofSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO proof_sessions (id, organization_id, cause_id, is_active, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.id.to_string())
        .bind(session.organization_id.to_string())
        .bind(session.cause_id.to_string())
        .bind(session.is_active)
        .bind(session.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ProofSession>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, cause_id, is_active, created_at
            FROM proof_sessions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;

        row.map(|(id, organization_id, cause_id, is_active, created_at)| {
            Ok(ProofSession {
                id: parse_uuid("proof_sessions.id", &id)?,
                organization_id: parse_uuid("proof_sessions.organization_id", &organization_id)?,
                cause_id: parse_uuid("proof_sessions.cause_id", &cause_id)?,
                is_active,
                created_at,
            })
        })
        .transpose()
    }
}

/// Proof images in the `proof_images` table
#[derive(Clone)]
pub struct SqliteProofImageRepository {
    db: SqlitePool,
}

impl SqliteProofImageRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProofImageRepository for SqliteProofImageRepository {
    async fn create(&self, image: &ProofImage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO proof_images
                (id, session_id, image_hash, latitude, longitude, timestamp, metadata_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(image.id.to_string())
        .bind(image.session_id.to_string())
        .bind(&image.image_hash)
        .bind(image.latitude)
        .bind(image.longitude)
        .bind(image.timestamp)
        .bind(image.metadata_score)
        .bind(image.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn exists_by_hash(&self, session_id: Uuid, image_hash: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM proof_images WHERE session_id = ? AND image_hash = ? LIMIT 1",
        )
        .bind(session_id.to_string())
        .bind(image_hash)
        .fetch_optional(&self.db)
        .await?;

        debug!(session_id = %session_id, hash = %image_hash, exists = found.is_some(), "Checked image hash");
        Ok(found.is_some())
    }

    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<ProofImage>> {
        let rows: Vec<ImageRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, image_hash, latitude, longitude, timestamp, metadata_score, created_at
            FROM proof_images
            WHERE session_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(
                |(id, session_id, image_hash, latitude, longitude, timestamp, metadata_score, created_at)| {
                    Ok(ProofImage {
                        id: parse_uuid("proof_images.id", &id)?,
                        session_id: parse_uuid("proof_images.session_id", &session_id)?,
                        image_hash,
                        latitude,
                        longitude,
                        timestamp,
                        metadata_score,
                        created_at,
                    })
                },
            )
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM proof_images WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.db)
            .await?;

        debug!(image_id = %id, removed = result.rows_affected(), "Deleted proof image");
        Ok(())
    }
}

/// Execution constraints from the `causes` table
#[derive(Clone)]
pub struct SqliteCauseExecutionLookup {
    db: SqlitePool,
}

impl SqliteCauseExecutionLookup {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CauseExecutionLookup for SqliteCauseExecutionLookup {
    async fn get_execution(&self, cause_id: Uuid) -> Result<Option<CauseExecution>> {
        let row: Option<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT id, execution_lat, execution_lng, execution_radius_meters,
                   execution_start_time, execution_end_time
            FROM causes
            WHERE id = ?
            "#,
        )
        .bind(cause_id.to_string())
        .fetch_optional(&self.db)
        .await?;

        row.map(|(id, lat, lng, radius, start, end)| {
            Ok(CauseExecution {
                cause_id: parse_uuid("causes.id", &id)?,
                execution_lat: lat,
                execution_lng: lng,
                execution_radius_meters: radius,
                execution_start_time: start,
                execution_end_time: end,
            })
        })
        .transpose()
    }
}
