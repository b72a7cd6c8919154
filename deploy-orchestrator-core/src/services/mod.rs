//! Business logic service layer

mod dispatcher;
mod dns_record_service;
mod history_service;
mod quick_action_service;

pub use dispatcher::DeploymentDispatcher;
pub use dns_record_service::DnsRecordService;
pub use history_service::{DeploymentHistoryService, DEFAULT_MAX_RECORDS};
pub use quick_action_service::{QuickActionExecutor, QuickActionOutcome};

use std::sync::Arc;

use deploy_orchestrator_provider::{DnsCredentials, DnsProvider};

use crate::error::CoreResult;
use crate::traits::{
    DeploymentHistoryRepository, DnsProviderFactory, DnsSnapshotRepository, DomainRegistrar,
    PropagationVerifier, SiteCatalog, TargetAdapterFactory,
};

/// Service context - holds all dependencies
///
/// The platform layer creates this context and injects its storage and
/// collaborator implementations.
pub struct ServiceContext {
    /// Builds hosting adapters
    pub adapter_factory: Arc<dyn TargetAdapterFactory>,
    /// Builds DNS provider clients
    pub dns_provider_factory: Arc<dyn DnsProviderFactory>,
    /// DoH verification and resolution
    pub propagation: Arc<dyn PropagationVerifier>,
    /// Deployment history persistence
    pub history_repository: Arc<dyn DeploymentHistoryRepository>,
    /// Last-known record sets
    pub snapshot_repository: Arc<dyn DnsSnapshotRepository>,
    /// Sites and artifacts
    pub site_catalog: Arc<dyn SiteCatalog>,
    /// Domain registration
    pub registrar: Arc<dyn DomainRegistrar>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        adapter_factory: Arc<dyn TargetAdapterFactory>,
        dns_provider_factory: Arc<dyn DnsProviderFactory>,
        propagation: Arc<dyn PropagationVerifier>,
        history_repository: Arc<dyn DeploymentHistoryRepository>,
        snapshot_repository: Arc<dyn DnsSnapshotRepository>,
        site_catalog: Arc<dyn SiteCatalog>,
        registrar: Arc<dyn DomainRegistrar>,
    ) -> Self {
        Self {
            adapter_factory,
            dns_provider_factory,
            propagation,
            history_repository,
            snapshot_repository,
            site_catalog,
            registrar,
        }
    }

    /// Get a DNS provider for the account
    pub fn get_dns_provider(&self, credentials: &DnsCredentials) -> CoreResult<Arc<dyn DnsProvider>> {
        self.dns_provider_factory.create(credentials)
    }
}
