//! Deployment history in `history.json`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use deploy_orchestrator_core::error::{CoreError, CoreResult};
use deploy_orchestrator_core::traits::DeploymentHistoryRepository;
use deploy_orchestrator_core::types::DeploymentRecord;

use super::json_file::{move_aside, read_store, write_store};

const STORE_FILE_NAME: &str = "history.json";
const RECORDS_KEY: &str = "records";

/// History repository backed by a JSON file in the data directory.
///
/// The file holds `{ "records": [...] }`, oldest first. A file that cannot be
/// parsed is renamed to `history.json.bak` and loads as empty, so the next save
/// never replaces the records it held.
pub struct JsonHistoryRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryRepository {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(STORE_FILE_NAME))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn parse(&self) -> CoreResult<Vec<DeploymentRecord>> {
        let Some(store) = read_store(&self.path).await? else {
            return Ok(Vec::new());
        };
        let records = store.get(RECORDS_KEY).cloned().unwrap_or(Value::Null);
        if records.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(records)
            .map_err(|e| CoreError::SerializationError(format!("Invalid history format: {e}")))
    }
}

#[async_trait]
impl DeploymentHistoryRepository for JsonHistoryRepository {
    async fn load(&self) -> CoreResult<Vec<DeploymentRecord>> {
        match self.parse().await {
            Err(e @ CoreError::SerializationError(_)) => {
                let backup = move_aside(&self.path).await?;
                log::warn!(
                    "Unreadable deployment history moved to {}: {e}",
                    backup.display()
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn save(&self, records: &[DeploymentRecord]) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        write_store(&self.path, &json!({ RECORDS_KEY: records })).await?;
        log::debug!("Saved {} deployment record(s)", records.len());
        Ok(())
    }
}
