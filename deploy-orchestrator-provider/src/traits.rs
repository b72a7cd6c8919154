use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{
    Artifact, BatchCreateFailure, BatchCreateResult, DeploymentTarget, DnsRecord, DnsRecordInput,
    PublishOutcome, SiteContext, Zone,
};

/// Error as returned by a remote API, before mapping (internal).
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// Provider-specific error code, if the API has one.
    pub code: Option<String>,
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Extra context that lets the mapper fill in names and ids (internal).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    pub record_name: Option<String>,
    pub record_id: Option<String>,
    pub domain: Option<String>,
}

/// Maps raw API errors onto [`ProviderError`] (internal).
pub(crate) trait ProviderErrorMapper {
    fn provider_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Authoritative DNS hosting.
///
/// Record names are relative to the zone (`@` for the apex) on both input and output.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// `Ok(false)` when the API answers but rejects the token.
    async fn validate_credentials(&self) -> Result<bool>;

    /// Exact zone-name lookup on the account. `Ok(None)` when absent.
    async fn find_zone(&self, domain: &str) -> Result<Option<Zone>>;

    async fn get_zone(&self, zone_id: &str) -> Result<Zone>;

    /// Add a domain to the account; the returned zone lists the assigned nameservers.
    async fn create_zone(&self, domain: &str) -> Result<Zone>;

    /// Every record in the zone, across all pages.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>>;

    async fn create_record(&self, zone_id: &str, input: &DnsRecordInput) -> Result<DnsRecord>;

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        input: &DnsRecordInput,
    ) -> Result<DnsRecord>;

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()>;

    /// Create several records, collecting per-record failures instead of aborting.
    ///
    /// The default issues every `create_record` concurrently.
    async fn batch_create_records(
        &self,
        zone_id: &str,
        inputs: &[DnsRecordInput],
    ) -> BatchCreateResult {
        let futures: Vec<_> = inputs
            .iter()
            .map(|input| self.create_record(zone_id, input))
            .collect();
        let results = futures::future::join_all(futures).await;

        let mut outcome = BatchCreateResult::default();
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => outcome.created_records.push(record),
                Err(e) => outcome.failures.push(BatchCreateFailure {
                    request_index: i,
                    record_name: inputs[i].name.clone(),
                    record_type: inputs[i].record_type,
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }
}

/// A hosting target that can publish an [`Artifact`].
///
/// Implementations read the artifact by reference and never mutate it. Any failure is
/// returned as a [`ProviderError`]; the dispatcher turns it into a failed result.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    fn target(&self) -> DeploymentTarget;

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome>;
}
