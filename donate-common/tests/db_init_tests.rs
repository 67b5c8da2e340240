//! Unit tests for database initialization
//!
//! - Database file is created on first run
//! - Reopening an existing database is idempotent
//! - Proof tables accept the rows the repositories write

use donate_common::db::init::{init_database, init_memory_database};
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("donate.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("donate.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_tables_exist() {
    let pool = init_memory_database().await.unwrap();
    let tables = table_names(&pool).await;

    for expected in ["causes", "proof_images", "proof_sessions"] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_image_hash_is_not_unique_at_storage_level() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query(
        "INSERT INTO proof_sessions (id, organization_id, cause_id, is_active, created_at)
         VALUES ('s1', 'o1', 'c1', 1, CURRENT_TIMESTAMP)",
    )
    .execute(&pool)
    .await
    .unwrap();

    for id in ["i1", "i2"] {
        let result = sqlx::query(
            "INSERT INTO proof_images (id, session_id, image_hash, metadata_score, created_at)
             VALUES (?, 's1', 'same-hash', 100, CURRENT_TIMESTAMP)",
        )
        .bind(id)
        .execute(&pool)
        .await;
        assert!(result.is_ok(), "insert {} failed: {:?}", id, result.err());
    }
}

#[tokio::test]
async fn test_image_requires_existing_session() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO proof_images (id, session_id, image_hash, metadata_score, created_at)
         VALUES ('i1', 'missing', 'h', 100, CURRENT_TIMESTAMP)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "foreign key should reject orphan image");
}

#[tokio::test]
async fn test_every_pooled_connection_is_configured() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("donate.db")).await.unwrap();

    // Held together, so each is a distinct connection
    let mut conns = Vec::new();
    for _ in 0..3 {
        conns.push(pool.acquire().await.unwrap());
    }

    for conn in conns.iter_mut() {
        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        let busy_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&mut **conn)
            .await
            .unwrap();

        assert_eq!(foreign_keys, 1);
        assert_eq!(busy_timeout, 5000);
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }
}
