//! Database initialization
//!
//! Creates the database file on first run and applies the proof schema.
//! Every statement is idempotent, so startup can run it unconditionally.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the database at `db_path` and apply the schema
///
/// Foreign keys, WAL and the busy timeout are connection options, so every
/// connection the pool opens gets them.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets viewers read while uploads write
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// Each SQLite `:memory:` connection is its own database, so the pool is
/// capped at one connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all proof tables
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_causes_table(pool).await?;
    create_proof_sessions_table(pool).await?;
    create_proof_images_table(pool).await?;
    Ok(())
}

/// Execution columns of the platform's cause table
///
/// The rest of the cause record is owned by the cause service; only the
/// columns read by proof validation are declared here.
async fn create_causes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS causes (
            id TEXT PRIMARY KEY,
            execution_lat REAL,
            execution_lng REAL,
            execution_radius_meters REAL,
            execution_start_time TIMESTAMP,
            execution_end_time TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_proof_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proof_sessions (
            id TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL,
            cause_id TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_proof_sessions_cause ON proof_sessions(cause_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Proof images
///
/// `(session_id, image_hash)` is indexed but deliberately not UNIQUE:
/// duplicate detection is an existence check made by the validation engine.
async fn create_proof_images_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proof_images (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES proof_sessions(id),
            image_hash TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            timestamp TIMESTAMP,
            metadata_score INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_proof_images_session_hash ON proof_images(session_id, image_hash)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
