//! `deploy` command

use anyhow::Context;
use clap::Args;

use deploy_orchestrator_core::error::CoreError;
use deploy_orchestrator_core::types::{DeploymentTarget, DispatchRequest, DnsSyncOptions};

use super::deploy_result_lines;
use crate::CommandContext;

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Site id or domain from the `[sites]` config
    pub site: String,

    /// Hosting target slug (cf-pages, netlify, cf-workers, s3-cloudfront, vps-ssh, git-push)
    #[arg(short, long)]
    pub target: DeploymentTarget,

    /// Skip the DNS update after publishing
    #[arg(long)]
    pub no_dns: bool,

    /// DNS account id (defaults to `[dns] default_account`)
    #[arg(long)]
    pub dns_account: Option<String>,

    /// Create records unproxied
    #[arg(long)]
    pub no_proxy: bool,
}

pub(crate) async fn execute(args: DeployArgs, ctx: &CommandContext) -> anyhow::Result<bool> {
    let catalog = &ctx.state.ctx.site_catalog;
    let site = catalog
        .find_site(&args.site)
        .await?
        .ok_or_else(|| CoreError::SiteNotFound(args.site.clone()))?;
    let artifact = catalog
        .render_artifact(&site)
        .await
        .with_context(|| format!("Failed to render site {}", site.site_id))?;
    let credentials = ctx.credentials.deploy_for(args.target)?;

    let mut request = DispatchRequest::new(artifact, site, credentials).with_target(args.target);
    if !args.no_dns && request.site.domain.is_some() {
        if ctx.credentials.has_dns() {
            let account = ctx.credentials.dns_account(args.dns_account.as_deref())?;
            request = request.with_dns(DnsSyncOptions::new(account.clone()).with_proxied(!args.no_proxy));
        } else {
            tracing::warn!("No DNS account configured, skipping the DNS update");
        }
    }

    let result = ctx.state.dispatcher.dispatch(request).await;
    ctx.output.emit(&result, deploy_result_lines)?;
    Ok(result.success && result.dns_updated != Some(false))
}
