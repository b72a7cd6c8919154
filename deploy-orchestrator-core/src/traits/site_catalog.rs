//! Site lookup and artifact rendering

use async_trait::async_trait;

use deploy_orchestrator_provider::{Artifact, SiteContext};

use crate::error::CoreResult;

/// Where sites and their rendered artifacts come from.
///
/// Artifact generation is outside the orchestrator; implementations may read
/// pre-built files or call a generator.
#[async_trait]
pub trait SiteCatalog: Send + Sync {
    /// Look a site up by id, falling back to its domain. `Ok(None)` when unknown.
    async fn find_site(&self, key: &str) -> CoreResult<Option<SiteContext>>;

    async fn render_artifact(&self, site: &SiteContext) -> CoreResult<Artifact>;
}
