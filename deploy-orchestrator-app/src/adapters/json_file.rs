//! Size-capped reads and replace-by-rename writes of JSON store files.

use std::path::{Path, PathBuf};

use serde_json::Value;

use deploy_orchestrator_core::error::{CoreError, CoreResult};

pub(crate) const MAX_STORE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Parsed contents of `path`, or `None` when the file does not exist yet.
pub(crate) async fn read_store(path: &Path) -> CoreResult<Option<Value>> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Store file does not exist: {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(CoreError::StorageError(format!(
                "Failed to read store file metadata: {e}"
            )));
        }
    };

    if metadata.len() > MAX_STORE_FILE_SIZE {
        return Err(CoreError::StorageError(format!(
            "Store file too large: {} bytes (max: {} bytes)",
            metadata.len(),
            MAX_STORE_FILE_SIZE
        )));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::StorageError(format!("Failed to read store file: {e}")))?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CoreError::SerializationError(format!("Invalid store format: {e}")))
}

/// Write `value` next to `path` and rename it into place.
pub(crate) async fn write_store(path: &Path, value: &Value) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to create store directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| CoreError::StorageError(format!("Failed to write store file: {e}")))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CoreError::StorageError(format!("Failed to replace store file: {e}")))
}

/// Rename an unreadable store file to `<name>.bak` so the next write starts fresh.
pub(crate) async fn move_aside(path: &Path) -> CoreResult<PathBuf> {
    let backup = sibling_path(path, ".bak");
    tokio::fs::rename(path, &backup)
        .await
        .map_err(|e| CoreError::StorageError(format!("Failed to move store file aside: {e}")))?;
    Ok(backup)
}

fn temp_path(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
