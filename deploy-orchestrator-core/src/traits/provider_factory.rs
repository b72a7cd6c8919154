//! Construction seams for target adapters and the DNS provider

use std::sync::Arc;

use deploy_orchestrator_provider::{
    create_dns_provider, create_target_adapter, DeployCredentials, DnsCredentials, DnsProvider,
    ProviderError, TargetAdapter,
};

use crate::error::{CoreError, CoreResult};

/// Builds the adapter for a set of deploy credentials.
pub trait TargetAdapterFactory: Send + Sync {
    fn create(&self, credentials: DeployCredentials) -> CoreResult<Arc<dyn TargetAdapter>>;
}

/// Builds a DNS provider client for an account.
pub trait DnsProviderFactory: Send + Sync {
    fn create(&self, credentials: &DnsCredentials) -> CoreResult<Arc<dyn DnsProvider>>;
}

/// Production adapters talking to the real hosting APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTargetAdapterFactory;

impl TargetAdapterFactory for DefaultTargetAdapterFactory {
    fn create(&self, credentials: DeployCredentials) -> CoreResult<Arc<dyn TargetAdapter>> {
        create_target_adapter(credentials).map_err(setup_error)
    }
}

/// Production Cloudflare DNS client.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDnsProviderFactory;

impl DnsProviderFactory for DefaultDnsProviderFactory {
    fn create(&self, credentials: &DnsCredentials) -> CoreResult<Arc<dyn DnsProvider>> {
        create_dns_provider(credentials).map_err(setup_error)
    }
}

/// Credential problems found while building a client are configuration errors.
fn setup_error(e: ProviderError) -> CoreError {
    if e.is_configuration() {
        CoreError::Configuration(e.to_string())
    } else {
        e.into()
    }
}
