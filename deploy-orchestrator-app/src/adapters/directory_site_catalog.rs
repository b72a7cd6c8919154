//! Sites declared in the config file, rendered from pre-built directories

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use deploy_orchestrator_core::error::{CoreError, CoreResult};
use deploy_orchestrator_core::traits::SiteCatalog;
use deploy_orchestrator_core::types::{Artifact, SiteContext};

use crate::config::SiteConfig;

/// Total bytes read into one artifact.
const MAX_ARTIFACT_SIZE: u64 = 100 * 1024 * 1024; // 100MB

struct SiteEntry {
    context: SiteContext,
    artifact_dir: Option<PathBuf>,
}

/// Site catalog over the `[sites.<id>]` tables.
///
/// The artifact of a site is every file under its `artifact_dir`, keyed by the
/// path relative to that directory.
pub struct DirectorySiteCatalog {
    sites: BTreeMap<String, SiteEntry>,
}

impl DirectorySiteCatalog {
    #[must_use]
    pub fn new(sites: &BTreeMap<String, SiteConfig>) -> Self {
        let sites = sites
            .iter()
            .map(|(id, config)| {
                let mut context = SiteContext::new(id.clone());
                context.domain.clone_from(&config.domain);
                context.brand_name.clone_from(&config.brand_name);
                context.html_filename.clone_from(&config.html_filename);
                (
                    id.clone(),
                    SiteEntry {
                        context,
                        artifact_dir: config.artifact_dir.clone(),
                    },
                )
            })
            .collect();
        Self { sites }
    }

}

#[async_trait]
impl SiteCatalog for DirectorySiteCatalog {
    async fn find_site(&self, key: &str) -> CoreResult<Option<SiteContext>> {
        let key = key.trim();
        if let Some(entry) = self.sites.get(key) {
            return Ok(Some(entry.context.clone()));
        }
        let domain = key.trim_end_matches('.');
        Ok(self
            .sites
            .values()
            .find(|entry| {
                entry
                    .context
                    .domain
                    .as_deref()
                    .is_some_and(|d| d.trim_end_matches('.').eq_ignore_ascii_case(domain))
            })
            .map(|entry| entry.context.clone()))
    }

    async fn render_artifact(&self, site: &SiteContext) -> CoreResult<Artifact> {
        let entry = self
            .sites
            .get(&site.site_id)
            .ok_or_else(|| CoreError::SiteNotFound(site.site_id.clone()))?;
        let dir = entry.artifact_dir.as_deref().ok_or_else(|| {
            CoreError::Configuration(format!("Site {} has no artifact_dir", site.site_id))
        })?;

        let artifact = read_artifact(dir).await?;
        log::debug!(
            "Read {} file(s), {} bytes for site {} from {}",
            artifact.len(),
            artifact.total_bytes(),
            site.site_id,
            dir.display()
        );
        Ok(artifact)
    }
}

async fn read_artifact(root: &Path) -> CoreResult<Artifact> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk_artifact(&root))
        .await
        .map_err(|e| CoreError::StorageError(format!("Artifact reader stopped: {e}")))?
}

/// Every regular file below `root`. Symlinks are not followed.
fn walk_artifact(root: &Path) -> CoreResult<Artifact> {
    let mut artifact = Artifact::new();
    let mut total: u64 = 0;

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| read_error(root, &e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let content = std::fs::read(entry.path()).map_err(|e| read_error(root, &e))?;
        total += content.len() as u64;
        if total > MAX_ARTIFACT_SIZE {
            return Err(CoreError::ValidationError(format!(
                "Artifact under {} exceeds {MAX_ARTIFACT_SIZE} bytes",
                root.display()
            )));
        }
        artifact.insert(&relative_key(root, entry.path()), content);
    }
    Ok(artifact)
}

fn read_error(root: &Path, e: &dyn std::fmt::Display) -> CoreError {
    CoreError::StorageError(format!("Failed to read {}: {e}", root.display()))
}

/// `/`-separated path of `path` below `root`.
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
