//! Factory functions for target adapters and the DNS provider.

use std::sync::Arc;

use crate::error::Result;
use crate::providers::CloudflareDnsClient;
use crate::targets::{
    CloudflarePagesAdapter, CloudflareWorkersAdapter, GitPushAdapter, NetlifyAdapter,
    S3CloudfrontAdapter, VpsAdapter,
};
use crate::traits::{DnsProvider, TargetAdapter};
use crate::types::{DeployCredentials, DnsCredentials};

/// Creates the [`TargetAdapter`] matching the credentials variant.
///
/// Credentials are validated locally first, so a missing field never reaches the network.
///
/// # Examples
///
/// ```rust,no_run
/// use deploy_orchestrator_provider::{create_target_adapter, DeployCredentials, NetlifyCredentials};
///
/// let adapter = create_target_adapter(DeployCredentials::Netlify(NetlifyCredentials {
///     api_token: "your-token".to_string(),
///     site_name: None,
/// })).unwrap();
/// ```
pub fn create_target_adapter(credentials: DeployCredentials) -> Result<Arc<dyn TargetAdapter>> {
    credentials.validate()?;
    Ok(match credentials {
        DeployCredentials::CloudflarePages(c) => Arc::new(CloudflarePagesAdapter::new(c)),
        DeployCredentials::Netlify(c) => Arc::new(NetlifyAdapter::new(c)),
        DeployCredentials::CloudflareWorkers(c) => Arc::new(CloudflareWorkersAdapter::new(c)),
        DeployCredentials::S3Cloudfront(c) => Arc::new(S3CloudfrontAdapter::new(c)),
        DeployCredentials::VpsSsh(c) => Arc::new(VpsAdapter::new(c)),
        DeployCredentials::GitPush(c) => Arc::new(GitPushAdapter::new(c)),
    })
}

/// Creates the Cloudflare DNS client behind a [`DnsProvider`] handle.
pub fn create_dns_provider(credentials: &DnsCredentials) -> Result<Arc<dyn DnsProvider>> {
    if credentials.api_token.trim().is_empty() {
        return Err(crate::error::ProviderError::MissingCredentials {
            provider: "cloudflare".to_string(),
            field: "api_token".to_string(),
        });
    }
    Ok(Arc::new(CloudflareDnsClient::new(credentials)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::types::{DeploymentTarget, GitPushCredentials, NetlifyCredentials};

    #[test]
    fn adapter_matches_credentials_variant() {
        let adapter = create_target_adapter(DeployCredentials::Netlify(NetlifyCredentials {
            api_token: "t".to_string(),
            site_name: None,
        }))
        .unwrap();
        assert_eq!(adapter.target(), DeploymentTarget::Netlify);
    }

    #[test]
    fn invalid_credentials_are_rejected_before_construction() {
        let result = create_target_adapter(DeployCredentials::GitPush(GitPushCredentials {
            proxy_url: "http://proxy".to_string(),
            repo_url: String::new(),
            branch: "main".to_string(),
            token: None,
            subdirectory: None,
        }));
        assert!(matches!(
            result,
            Err(ProviderError::MissingCredentials { field, .. }) if field == "repo_url"
        ));
    }

    #[test]
    fn dns_provider_requires_token() {
        let result = create_dns_provider(&DnsCredentials {
            account_id: String::new(),
            api_token: " ".to_string(),
        });
        assert!(result.is_err());
    }
}
