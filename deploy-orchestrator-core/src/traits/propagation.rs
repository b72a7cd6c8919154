//! DNS lookups over DoH as seen by the services

use async_trait::async_trait;

use deploy_orchestrator_toolbox::{DnsQueryType, PropagationChecker, PropagationVerdict};

use crate::error::CoreResult;

/// Propagation verification and plain resolution.
#[async_trait]
pub trait PropagationVerifier: Send + Sync {
    /// Ask every resolver once and aggregate.
    async fn verify(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
        expected: Option<&str>,
    ) -> CoreResult<PropagationVerdict>;

    /// Current answers for a hostname.
    async fn resolve_host(&self, hostname: &str, record_type: DnsQueryType)
        -> CoreResult<Vec<String>>;
}

#[async_trait]
impl PropagationVerifier for PropagationChecker {
    async fn verify(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
        expected: Option<&str>,
    ) -> CoreResult<PropagationVerdict> {
        Ok(self
            .check_propagation(hostname, record_type, expected)
            .await?)
    }

    async fn resolve_host(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
    ) -> CoreResult<Vec<String>> {
        Ok(self.resolve(hostname, record_type).await?)
    }
}
