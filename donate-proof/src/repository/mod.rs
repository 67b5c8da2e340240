//! Persistence contracts consumed by the validation engine
//!
//! Sessions, images and cause execution constraints live in the platform
//! database. The engine only depends on these traits; [`sqlite`] is the
//! production implementation and [`memory`] backs tests.

use async_trait::async_trait;
use donate_common::db::{CauseExecution, ProofImage, ProofSession};
use donate_common::Result;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryProofStore;
pub use sqlite::{SqliteCauseExecutionLookup, SqliteProofImageRepository, SqliteProofSessionRepository};

/// Proof session persistence
#[async_trait]
pub trait ProofSessionRepository: Send + Sync {
    async fn create(&self, session: &ProofSession) -> Result<()>;

    /// Session by id regardless of `is_active`; `None` when unknown
    async fn get_by_id(&self, id: Uuid) -> Result<Option<ProofSession>>;
}

/// Proof image persistence
#[async_trait]
pub trait ProofImageRepository: Send + Sync {
    async fn create(&self, image: &ProofImage) -> Result<()>;

    /// True when `session_id` already holds an image with `image_hash`
    async fn exists_by_hash(&self, session_id: Uuid, image_hash: &str) -> Result<bool>;

    /// Images of a session, oldest first
    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<ProofImage>>;

    /// Remove an image record; unknown ids are not an error
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Read-only view of a cause's execution constraints
#[async_trait]
pub trait CauseExecutionLookup: Send + Sync {
    /// `None` when the cause has no execution record at all
    async fn get_execution(&self, cause_id: Uuid) -> Result<Option<CauseExecution>>;
}
