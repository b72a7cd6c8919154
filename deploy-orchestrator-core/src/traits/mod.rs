//! Storage layer and collaborator trait definitions

mod history_repository;
mod propagation;
mod provider_factory;
mod registrar;
mod site_catalog;
mod snapshot_repository;

pub use history_repository::{DeploymentHistoryRepository, InMemoryHistoryRepository};
pub use propagation::PropagationVerifier;
pub use provider_factory::{
    DefaultDnsProviderFactory, DefaultTargetAdapterFactory, DnsProviderFactory,
    TargetAdapterFactory,
};
pub use registrar::{DomainRegistrar, ManualRegistrar, RegistrationReceipt};
pub use site_catalog::SiteCatalog;
pub use snapshot_repository::{DnsSnapshotRepository, InMemorySnapshotRepository};
