//! Credentials handed to the quick-action executor

use std::collections::BTreeMap;

use deploy_orchestrator_provider::{DeployCredentials, DeploymentTarget, DnsCredentials};

use crate::error::{CoreError, CoreResult};

/// Deploy credentials per target plus named DNS accounts.
///
/// Built by the caller for one execution; never persisted.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    deploy: BTreeMap<DeploymentTarget, DeployCredentials>,
    dns_accounts: BTreeMap<String, DnsCredentials>,
    default_dns_account: Option<String>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials under the target they belong to.
    #[must_use]
    pub fn with_deploy(mut self, credentials: DeployCredentials) -> Self {
        self.deploy.insert(credentials.target(), credentials);
        self
    }

    /// Register a DNS account. The first one becomes the default.
    #[must_use]
    pub fn with_dns_account(mut self, id: impl Into<String>, credentials: DnsCredentials) -> Self {
        let id = id.into();
        if self.default_dns_account.is_none() {
            self.default_dns_account = Some(id.clone());
        }
        self.dns_accounts.insert(id, credentials);
        self
    }

    #[must_use]
    pub fn with_default_dns_account(mut self, id: impl Into<String>) -> Self {
        self.default_dns_account = Some(id.into());
        self
    }

    pub fn deploy_for(&self, target: DeploymentTarget) -> CoreResult<DeployCredentials> {
        self.deploy.get(&target).cloned().ok_or_else(|| {
            CoreError::Configuration(format!("No credentials configured for target {target}"))
        })
    }

    /// The named account, or the default one when `id` is `None`.
    pub fn dns_account(&self, id: Option<&str>) -> CoreResult<&DnsCredentials> {
        let id = id
            .or(self.default_dns_account.as_deref())
            .ok_or_else(|| CoreError::Configuration("No DNS account configured".to_string()))?;
        self.dns_accounts
            .get(id)
            .ok_or_else(|| CoreError::Configuration(format!("Unknown DNS account: {id}")))
    }

    pub fn has_dns(&self) -> bool {
        !self.dns_accounts.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use deploy_orchestrator_provider::NetlifyCredentials;

    fn dns(token: &str) -> DnsCredentials {
        DnsCredentials {
            account_id: "acct".to_string(),
            api_token: token.to_string(),
        }
    }

    #[test]
    fn first_dns_account_is_default() {
        let set = CredentialSet::new()
            .with_dns_account("main", dns("a"))
            .with_dns_account("other", dns("b"));
        assert_eq!(set.dns_account(None).unwrap().api_token, "a");
        assert_eq!(set.dns_account(Some("other")).unwrap().api_token, "b");
        assert!(matches!(
            set.dns_account(Some("nope")),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn deploy_credentials_are_keyed_by_target() {
        let set = CredentialSet::new().with_deploy(DeployCredentials::Netlify(NetlifyCredentials {
            api_token: "t".to_string(),
            site_name: None,
        }));
        assert!(set.deploy_for(DeploymentTarget::Netlify).is_ok());
        assert!(matches!(
            set.deploy_for(DeploymentTarget::GitPush),
            Err(CoreError::Configuration(_))
        ));
    }
}
