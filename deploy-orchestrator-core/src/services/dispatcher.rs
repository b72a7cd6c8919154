//! Deployment dispatcher

use std::sync::Arc;
use std::time::Instant;

use deploy_orchestrator_provider::{
    Artifact, DeployCredentials, DeploymentTarget, PublishOutcome, SiteContext,
};

use crate::error::{CoreError, CoreResult};
use crate::services::{DeploymentHistoryService, DnsRecordService, ServiceContext};
use crate::types::{DeployResult, DispatchRequest, DnsSyncOptions};

/// Routes a deploy to the right target adapter and normalizes the outcome
///
/// Every dispatch that reaches a known target ends up in the history exactly
/// once, whether it succeeded or not. A DNS failure never turns a successful
/// publish into a failure.
pub struct DeploymentDispatcher {
    ctx: Arc<ServiceContext>,
    dns: Arc<DnsRecordService>,
    history: Arc<DeploymentHistoryService>,
}

impl DeploymentDispatcher {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        dns: Arc<DnsRecordService>,
        history: Arc<DeploymentHistoryService>,
    ) -> Self {
        Self { ctx, dns, history }
    }

    pub fn history(&self) -> &Arc<DeploymentHistoryService> {
        &self.history
    }

    /// Publish the artifact and, when asked, point the site's domain at it.
    pub async fn dispatch(&self, request: DispatchRequest) -> DeployResult {
        let started = Instant::now();
        let DispatchRequest {
            target,
            artifact,
            site,
            credentials,
            dns,
        } = request;
        let domain = site.domain.clone().unwrap_or_default();

        log::info!(
            "Dispatching {} ({} file(s), {} bytes) to {target}",
            site.site_id,
            artifact.len(),
            artifact.total_bytes()
        );

        let mut result = match self.publish(target, artifact, &site, credentials).await {
            Ok(outcome) => {
                log::info!("Published {} to {target}: {}", site.site_id, outcome.url);
                let mut result =
                    DeployResult::published(target, outcome.url.clone(), outcome.deployment_id.clone());
                if let Some(options) = dns {
                    self.sync_dns(&mut result, &site, &outcome, &options).await;
                }
                result
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Deploy of {} to {target} failed: {e}", site.site_id);
                } else {
                    log::error!("Deploy of {} to {target} failed: {e}", site.site_id);
                }
                DeployResult::failed(Some(target), e.to_string())
            }
        };

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let Err(e) = self.history.record(&result, target, &domain).await {
            log::error!("Failed to persist deployment history: {e}");
        }
        result
    }

    /// [`dispatch`](Self::dispatch) with the target given by its slug.
    ///
    /// An unknown slug fails without touching the history.
    pub async fn dispatch_named(
        &self,
        target: &str,
        artifact: Artifact,
        site: SiteContext,
        credentials: DeployCredentials,
        dns: Option<DnsSyncOptions>,
    ) -> DeployResult {
        let target = match target.parse::<DeploymentTarget>() {
            Ok(target) => target,
            Err(e) => {
                log::warn!("{e}");
                return DeployResult::failed(None, e.to_string());
            }
        };
        let mut request = DispatchRequest::new(artifact, site, credentials).with_target(target);
        request.dns = dns;
        self.dispatch(request).await
    }

    async fn publish(
        &self,
        target: DeploymentTarget,
        mut artifact: Artifact,
        site: &SiteContext,
        credentials: DeployCredentials,
    ) -> CoreResult<PublishOutcome> {
        if credentials.target() != target {
            return Err(CoreError::Configuration(format!(
                "Credentials for {} cannot deploy to {target}",
                credentials.target()
            )));
        }
        let adapter = self.ctx.adapter_factory.create(credentials)?;

        if artifact.is_empty() {
            return Err(CoreError::ValidationError("Artifact is empty".to_string()));
        }
        if let Some(filename) = site.html_filename.as_deref() {
            if artifact.ensure_index(filename) {
                log::debug!("Published {filename} as index.html");
            }
        }
        if artifact.index_html().is_none() {
            return Err(CoreError::ValidationError(
                "Artifact has no index.html".to_string(),
            ));
        }

        Ok(adapter.publish(&artifact, site).await?)
    }

    async fn sync_dns(
        &self,
        result: &mut DeployResult,
        site: &SiteContext,
        outcome: &PublishOutcome,
        options: &DnsSyncOptions,
    ) {
        let Some(domain) = site.domain.as_deref() else {
            log::debug!("{} has no domain, skipping DNS update", site.site_id);
            return;
        };
        let Some(dns_target) = outcome.dns_target.as_ref() else {
            log::debug!("Target exposes no DNS endpoint, skipping DNS update for {domain}");
            return;
        };

        match self
            .dns
            .sync_deployment(&options.credentials, domain, dns_target, options.proxied)
            .await
        {
            Ok(_) => result.dns_updated = Some(true),
            Err(e) => {
                log::warn!("DNS update for {domain} failed: {e}");
                result.dns_updated = Some(false);
                result.dns_error = Some(e.to_string());
            }
        }
    }
}
