//! Deployment history persistence

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::types::DeploymentRecord;

/// Stores the retained history list as a whole.
///
/// Platform implementations:
/// - In-process: [`InMemoryHistoryRepository`]
/// - App: `JsonHistoryRepository` (`history.json` in the data directory)
#[async_trait]
pub trait DeploymentHistoryRepository: Send + Sync {
    /// Load the persisted list, oldest first. Empty when nothing was saved yet.
    async fn load(&self) -> CoreResult<Vec<DeploymentRecord>>;

    /// Replace the persisted list.
    async fn save(&self, records: &[DeploymentRecord]) -> CoreResult<()>;
}

/// Keeps the list in memory only.
#[derive(Clone, Default)]
pub struct InMemoryHistoryRepository {
    records: Arc<RwLock<Vec<DeploymentRecord>>>,
}

impl InMemoryHistoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentHistoryRepository for InMemoryHistoryRepository {
    async fn load(&self) -> CoreResult<Vec<DeploymentRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, records: &[DeploymentRecord]) -> CoreResult<()> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}
