//! DNS record service types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deploy_orchestrator_provider::{DnsRecord, DnsRecordType};

/// What an upsert did to the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub record: DnsRecord,
}

/// A template record that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFailure {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub reason: String,
}

/// Per-record tally of a template application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateApplyResult {
    pub created: usize,
    /// Identical to a record already in the zone.
    pub skipped: usize,
    pub failed: Vec<TemplateFailure>,
    /// The records that were created.
    pub records: Vec<DnsRecord>,
}

impl TemplateApplyResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Last record set fetched for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSnapshot {
    pub zone_id: String,
    pub records: Vec<DnsRecord>,
    pub fetched_at: DateTime<Utc>,
}
