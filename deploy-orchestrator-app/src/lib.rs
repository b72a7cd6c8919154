//! Platform-agnostic application bootstrap for the deploy orchestrator.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter injection)
//! and `OrchestratorConfig` (the TOML configuration file).

pub mod adapters;
pub mod config;

use std::sync::Arc;

use deploy_orchestrator_core::error::{CoreError, CoreResult};
use deploy_orchestrator_core::services::{
    DeploymentDispatcher, DeploymentHistoryService, DnsRecordService, QuickActionExecutor,
    ServiceContext, DEFAULT_MAX_RECORDS,
};
use deploy_orchestrator_core::traits::{
    DefaultDnsProviderFactory, DefaultTargetAdapterFactory, DeploymentHistoryRepository,
    DnsProviderFactory, DnsSnapshotRepository, DomainRegistrar, ManualRegistrar,
    PropagationVerifier, SiteCatalog, TargetAdapterFactory,
};
use deploy_orchestrator_toolbox::PropagationChecker;

use crate::adapters::{DirectorySiteCatalog, JsonHistoryRepository, JsonSnapshotRepository};
pub use crate::config::OrchestratorConfig;

/// Platform-agnostic application state.
///
/// Holds all services and the `ServiceContext`. Every frontend constructs this
/// once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (holds all adapters)
    pub ctx: Arc<ServiceContext>,
    /// DNS record service
    pub dns_service: Arc<DnsRecordService>,
    /// Deployment history
    pub history_service: Arc<DeploymentHistoryService>,
    /// Deployment dispatcher
    pub dispatcher: Arc<DeploymentDispatcher>,
    /// Quick-action executor
    pub executor: QuickActionExecutor,
}

impl AppState {
    /// State wired from a config file: JSON stores in the data directory, the
    /// configured sites and resolvers, production adapters.
    pub fn from_config(config: &OrchestratorConfig) -> CoreResult<Self> {
        AppStateBuilder::new().with_config(config)?.build()
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `history_repository`: where deployment history is stored
/// - `snapshot_repository`: where DNS snapshots are stored
/// - `site_catalog`: where sites and artifacts come from
///
/// # Optional
/// - `adapter_factory`: defaults to `DefaultTargetAdapterFactory`
/// - `dns_provider_factory`: defaults to `DefaultDnsProviderFactory`
/// - `propagation`: defaults to `PropagationChecker` with the public resolvers
/// - `registrar`: defaults to `ManualRegistrar`
/// - `max_records`: defaults to `DEFAULT_MAX_RECORDS`
pub struct AppStateBuilder {
    adapter_factory: Option<Arc<dyn TargetAdapterFactory>>,
    dns_provider_factory: Option<Arc<dyn DnsProviderFactory>>,
    propagation: Option<Arc<dyn PropagationVerifier>>,
    history_repository: Option<Arc<dyn DeploymentHistoryRepository>>,
    snapshot_repository: Option<Arc<dyn DnsSnapshotRepository>>,
    site_catalog: Option<Arc<dyn SiteCatalog>>,
    registrar: Option<Arc<dyn DomainRegistrar>>,
    max_records: usize,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapter_factory: None,
            dns_provider_factory: None,
            propagation: None,
            history_repository: None,
            snapshot_repository: None,
            site_catalog: None,
            registrar: None,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    /// Fill stores, sites, resolvers and the history bound from `config`.
    pub fn with_config(self, config: &OrchestratorConfig) -> CoreResult<Self> {
        let data_dir = config.data_dir()?;
        log::debug!("Data directory: {}", data_dir.display());

        Ok(self
            .history_repository(Arc::new(JsonHistoryRepository::new(&data_dir)))
            .snapshot_repository(Arc::new(JsonSnapshotRepository::new(&data_dir)))
            .site_catalog(Arc::new(DirectorySiteCatalog::new(&config.sites)))
            .propagation(Arc::new(config.propagation_checker()))
            .max_records(config.history.max_records))
    }

    #[must_use]
    pub fn adapter_factory(mut self, factory: Arc<dyn TargetAdapterFactory>) -> Self {
        self.adapter_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn dns_provider_factory(mut self, factory: Arc<dyn DnsProviderFactory>) -> Self {
        self.dns_provider_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn propagation(mut self, propagation: Arc<dyn PropagationVerifier>) -> Self {
        self.propagation = Some(propagation);
        self
    }

    #[must_use]
    pub fn history_repository(mut self, repo: Arc<dyn DeploymentHistoryRepository>) -> Self {
        self.history_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn snapshot_repository(mut self, repo: Arc<dyn DnsSnapshotRepository>) -> Self {
        self.snapshot_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn site_catalog(mut self, catalog: Arc<dyn SiteCatalog>) -> Self {
        self.site_catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn registrar(mut self, registrar: Arc<dyn DomainRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    #[must_use]
    pub fn max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let history_repository = self.history_repository.ok_or_else(|| {
            CoreError::ValidationError("history_repository is required".to_string())
        })?;
        let snapshot_repository = self.snapshot_repository.ok_or_else(|| {
            CoreError::ValidationError("snapshot_repository is required".to_string())
        })?;
        let site_catalog = self
            .site_catalog
            .ok_or_else(|| CoreError::ValidationError("site_catalog is required".to_string()))?;
        let adapter_factory = self
            .adapter_factory
            .unwrap_or_else(|| Arc::new(DefaultTargetAdapterFactory));
        let dns_provider_factory = self
            .dns_provider_factory
            .unwrap_or_else(|| Arc::new(DefaultDnsProviderFactory));
        let propagation = self
            .propagation
            .unwrap_or_else(|| Arc::new(PropagationChecker::new()));
        let registrar = self.registrar.unwrap_or_else(|| Arc::new(ManualRegistrar));

        let ctx = Arc::new(ServiceContext::new(
            adapter_factory,
            dns_provider_factory,
            propagation,
            history_repository,
            snapshot_repository,
            site_catalog,
            registrar,
        ));

        let dns_service = Arc::new(DnsRecordService::new(Arc::clone(&ctx)));
        let history_service = Arc::new(DeploymentHistoryService::with_max_records(
            Arc::clone(&ctx),
            self.max_records,
        ));
        let dispatcher = Arc::new(DeploymentDispatcher::new(
            Arc::clone(&ctx),
            Arc::clone(&dns_service),
            Arc::clone(&history_service),
        ));
        let executor = QuickActionExecutor::new(
            Arc::clone(&ctx),
            Arc::clone(&dispatcher),
            Arc::clone(&dns_service),
        );

        Ok(AppState {
            ctx,
            dns_service,
            history_service,
            dispatcher,
            executor,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
