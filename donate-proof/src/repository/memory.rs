//! In-memory repositories
//!
//! One store implements all three contracts. Used by tests and by callers
//! that embed the engine without a database.

use super::{CauseExecutionLookup, ProofImageRepository, ProofSessionRepository};
use async_trait::async_trait;
use donate_common::db::{CauseExecution, ProofImage, ProofSession};
use donate_common::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryProofStore {
    sessions: RwLock<HashMap<Uuid, ProofSession>>,
    images: RwLock<Vec<ProofImage>>,
    executions: RwLock<HashMap<Uuid, CauseExecution>>,
}

impl MemoryProofStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the execution record of a cause
    pub async fn put_execution(&self, execution: CauseExecution) {
        self.executions
            .write()
            .await
            .insert(execution.cause_id, execution);
    }

    /// Drop the execution record of a cause entirely
    pub async fn remove_execution(&self, cause_id: Uuid) {
        self.executions.write().await.remove(&cause_id);
    }

    /// Soft-disable a session
    pub async fn deactivate_session(&self, id: Uuid) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.is_active = false;
        }
    }

    pub async fn image_count(&self) -> usize {
        self.images.read().await.len()
    }
}

#[async_trait]
impl ProofSessionRepository for MemoryProofStore {
    async fn create(&self, session: &ProofSession) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ProofSession>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ProofImageRepository for MemoryProofStore {
    async fn create(&self, image: &ProofImage) -> Result<()> {
        self.images.write().await.push(image.clone());
        Ok(())
    }

    async fn exists_by_hash(&self, session_id: Uuid, image_hash: &str) -> Result<bool> {
        Ok(self
            .images
            .read()
            .await
            .iter()
            .any(|img| img.session_id == session_id && img.image_hash == image_hash))
    }

    async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<ProofImage>> {
        Ok(self
            .images
            .read()
            .await
            .iter()
            .filter(|img| img.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.images.write().await.retain(|img| img.id != id);
        Ok(())
    }
}

#[async_trait]
impl CauseExecutionLookup for MemoryProofStore {
    async fn get_execution(&self, cause_id: Uuid) -> Result<Option<CauseExecution>> {
        Ok(self.executions.read().await.get(&cause_id).cloned())
    }
}
