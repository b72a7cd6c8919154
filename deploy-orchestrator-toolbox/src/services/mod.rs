//! Propagation checker façade.

mod doh;
mod propagation;

use reqwest::Client;
use tokio::time::Duration;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsQueryType, DohResolver, PropagationVerdict, DEFAULT_TIMEOUT_SECS};

const USER_AGENT: &str = concat!("deploy-orchestrator/", env!("CARGO_PKG_VERSION"));

/// Validate and normalise a hostname: trimmed, lowercase, no trailing dot.
fn validate_hostname(hostname: &str) -> ToolboxResult<String> {
    let hostname = hostname.trim().trim_end_matches('.');
    if hostname.is_empty() {
        return Err(ToolboxError::ValidationError(
            "Hostname is required".to_string(),
        ));
    }
    if hostname.len() > 253 {
        return Err(ToolboxError::ValidationError(format!(
            "Hostname exceeds maximum length of 253 characters (got {})",
            hostname.len()
        )));
    }
    if hostname.contains(char::is_whitespace) || hostname.contains('/') {
        return Err(ToolboxError::ValidationError(format!(
            "Invalid hostname: {hostname}"
        )));
    }
    Ok(hostname.to_ascii_lowercase())
}

/// Checks whether a DNS change is visible from several public DoH resolvers.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct PropagationChecker {
    client: Client,
    resolvers: Vec<DohResolver>,
    timeout: Duration,
}

impl Default for PropagationChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationChecker {
    /// Default resolvers with a 5 second per-resolver timeout.
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[doh] Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            client,
            resolvers: DohResolver::defaults(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Replace the resolver list; an empty list keeps the defaults.
    #[must_use]
    pub fn with_resolvers(mut self, resolvers: Vec<DohResolver>) -> Self {
        if !resolvers.is_empty() {
            self.resolvers = resolvers;
        }
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn resolvers(&self) -> &[DohResolver] {
        &self.resolvers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query every resolver once and combine the answers.
    ///
    /// With `expected`, a resolver matches when its first answer equals it exactly;
    /// without, any non-empty answer matches. `propagated` is the AND over resolvers.
    pub async fn check_propagation(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
        expected: Option<&str>,
    ) -> ToolboxResult<PropagationVerdict> {
        let hostname = validate_hostname(hostname)?;
        let verdict = propagation::check_propagation(
            &self.client,
            &self.resolvers,
            self.timeout,
            &hostname,
            record_type,
            expected.map(str::trim).filter(|e| !e.is_empty()),
        )
        .await;
        log::info!(
            "[doh] {hostname} {record_type}: {}/{} resolvers agree",
            verdict.matching_count(),
            verdict.per_server.len()
        );
        Ok(verdict)
    }

    /// All answers from the first resolver that responds. Empty for NXDOMAIN.
    pub async fn resolve(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
    ) -> ToolboxResult<Vec<String>> {
        let hostname = validate_hostname(hostname)?;
        let mut last_error = None;
        for resolver in &self.resolvers {
            match tokio::time::timeout(
                self.timeout,
                doh::query(&self.client, resolver, &hostname, record_type),
            )
            .await
            {
                Ok(Ok(answers)) => return Ok(answers),
                Ok(Err(e)) => last_error = Some(e),
                Err(_) => {
                    last_error = Some(ToolboxError::NetworkError(format!(
                        "{}: query timeout",
                        resolver.name
                    )));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ToolboxError::NetworkError("No resolvers configured".to_string())
        }))
    }

    /// Re-check every `interval` until propagated or `max_attempts` checks ran.
    ///
    /// Returns the last verdict either way. Dropping the future stops polling.
    pub async fn poll_until_propagated(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
        expected: Option<&str>,
        interval: Duration,
        max_attempts: u32,
    ) -> ToolboxResult<PropagationVerdict> {
        let attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let verdict = self.check_propagation(hostname, record_type, expected).await?;
            if verdict.propagated || attempt >= attempts {
                return Ok(verdict);
            }
            log::debug!("[doh] {hostname} not propagated yet (attempt {attempt}/{attempts})");
            attempt += 1;
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_normalized() {
        assert_eq!(validate_hostname("  WWW.Example.com. ").unwrap(), "www.example.com");
    }

    #[test]
    fn empty_hostname_is_rejected() {
        assert!(matches!(
            validate_hostname("   "),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn hostname_with_spaces_is_rejected() {
        assert!(matches!(
            validate_hostname("not a host"),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn empty_resolver_list_keeps_defaults() {
        let checker = PropagationChecker::new().with_resolvers(vec![]);
        assert_eq!(checker.resolvers().len(), 3);
        assert_eq!(checker.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
