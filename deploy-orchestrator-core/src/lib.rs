//! Deploy Orchestrator Core Library
//!
//! Platform-independent business logic of the deploy orchestrator:
//! - Deployment dispatch to the hosting targets, with DNS follow-up
//! - DNS record management (validation, upsert, templates)
//! - Bounded deployment history with statistics
//! - The quick-action wizard and its executor
//!
//! Storage and outside collaborators (site catalog, registrar, propagation checker)
//! are reached through traits; the application layer injects the implementations
//! into a [`ServiceContext`].

pub mod error;
pub mod services;
pub mod templates;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{
    DeploymentHistoryRepository, DnsProviderFactory, DnsSnapshotRepository, DomainRegistrar,
    PropagationVerifier, SiteCatalog, TargetAdapterFactory,
};
