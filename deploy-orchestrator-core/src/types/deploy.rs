//! Dispatch request and result types

use serde::{Deserialize, Serialize};

use deploy_orchestrator_provider::{
    Artifact, DeployCredentials, DeploymentTarget, DnsCredentials, SiteContext,
};

/// DNS update to run after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSyncOptions {
    pub credentials: DnsCredentials,
    /// Put proxiable records behind the Cloudflare proxy.
    #[serde(default = "default_proxied")]
    pub proxied: bool,
}

fn default_proxied() -> bool {
    true
}

impl DnsSyncOptions {
    pub fn new(credentials: DnsCredentials) -> Self {
        Self {
            credentials,
            proxied: true,
        }
    }

    #[must_use]
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

/// Everything one dispatch needs. Consumed by the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub target: DeploymentTarget,
    pub artifact: Artifact,
    pub site: SiteContext,
    pub credentials: DeployCredentials,
    pub dns: Option<DnsSyncOptions>,
}

impl DispatchRequest {
    /// Request for the target the credentials belong to.
    pub fn new(artifact: Artifact, site: SiteContext, credentials: DeployCredentials) -> Self {
        Self {
            target: credentials.target(),
            artifact,
            site,
            credentials,
            dns: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: DeploymentTarget) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_dns(mut self, dns: DnsSyncOptions) -> Self {
        self.dns = Some(dns);
        self
    }
}

/// Normalized outcome of one dispatch.
///
/// `success` describes the publish step only. `dns_updated`/`dns_error` are filled
/// independently and stay `None` when no DNS step ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DeploymentTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_updated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_error: Option<String>,
}

impl DeployResult {
    /// Failed result that never reached the publish step.
    pub fn failed(target: Option<DeploymentTarget>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            target,
            url: None,
            deployment_id: None,
            error: Some(error.into()),
            duration_ms: 0,
            dns_updated: None,
            dns_error: None,
        }
    }

    pub fn published(
        target: DeploymentTarget,
        url: String,
        deployment_id: Option<String>,
    ) -> Self {
        Self {
            success: true,
            target: Some(target),
            url: Some(url),
            deployment_id,
            error: None,
            duration_ms: 0,
            dns_updated: None,
            dns_error: None,
        }
    }
}
