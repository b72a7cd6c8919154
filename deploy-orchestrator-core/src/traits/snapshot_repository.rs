//! Last-known DNS record sets per zone

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::types::DnsSnapshot;

/// Persists the most recent record listing of each zone.
#[async_trait]
pub trait DnsSnapshotRepository: Send + Sync {
    async fn find(&self, zone_id: &str) -> CoreResult<Option<DnsSnapshot>>;

    /// Replace the snapshot stored for `snapshot.zone_id`.
    async fn save(&self, snapshot: &DnsSnapshot) -> CoreResult<()>;
}

#[derive(Clone, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: Arc<RwLock<HashMap<String, DnsSnapshot>>>,
}

impl InMemorySnapshotRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DnsSnapshotRepository for InMemorySnapshotRepository {
    async fn find(&self, zone_id: &str) -> CoreResult<Option<DnsSnapshot>> {
        Ok(self.snapshots.read().await.get(zone_id).cloned())
    }

    async fn save(&self, snapshot: &DnsSnapshot) -> CoreResult<()> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.zone_id.clone(), snapshot.clone());
        Ok(())
    }
}
