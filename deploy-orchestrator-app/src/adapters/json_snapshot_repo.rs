//! Last-known DNS record sets in `dns-snapshots.json`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use deploy_orchestrator_core::error::{CoreError, CoreResult};
use deploy_orchestrator_core::traits::DnsSnapshotRepository;
use deploy_orchestrator_core::types::DnsSnapshot;

use super::json_file::{read_store, write_store};

const STORE_FILE_NAME: &str = "dns-snapshots.json";

/// Snapshot repository backed by one JSON object keyed by zone id.
pub struct JsonSnapshotRepository {
    path: PathBuf,
    /// In-memory cache, filled on first access.
    cache: RwLock<Option<HashMap<String, DnsSnapshot>>>,
}

impl JsonSnapshotRepository {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STORE_FILE_NAME),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_from_store(&self) -> CoreResult<HashMap<String, DnsSnapshot>> {
        match read_store(&self.path).await? {
            None | Some(Value::Null) => Ok(HashMap::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                CoreError::SerializationError(format!("Invalid snapshot format: {e}"))
            }),
        }
    }
}

#[async_trait]
impl DnsSnapshotRepository for JsonSnapshotRepository {
    async fn find(&self, zone_id: &str) -> CoreResult<Option<DnsSnapshot>> {
        {
            let cache = self.cache.read().await;
            if let Some(ref snapshots) = *cache {
                return Ok(snapshots.get(zone_id).cloned());
            }
        }

        let mut cache = self.cache.write().await;
        if cache.is_none() {
            *cache = Some(self.load_from_store().await?);
        }
        Ok(cache.as_ref().and_then(|s| s.get(zone_id).cloned()))
    }

    async fn save(&self, snapshot: &DnsSnapshot) -> CoreResult<()> {
        let mut cache = self.cache.write().await;
        if cache.is_none() {
            *cache = Some(self.load_from_store().await?);
        }
        let snapshots = cache.get_or_insert_with(HashMap::new);
        snapshots.insert(snapshot.zone_id.clone(), snapshot.clone());

        let value = serde_json::to_value(&*snapshots)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        write_store(&self.path, &value).await?;
        log::debug!(
            "Saved snapshot of zone {} ({} record(s))",
            snapshot.zone_id,
            snapshot.records.len()
        );
        Ok(())
    }
}
