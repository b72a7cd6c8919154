//! Deployment history types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deploy_orchestrator_provider::DeploymentTarget;

use super::DeployResult;

/// Outcome of the publish step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Success,
    Failed,
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// One dispatch attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub id: String,
    pub domain: String,
    pub target: DeploymentTarget,
    pub status: DeployStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_updated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentRecord {
    /// Snapshot a dispatch result with a fresh id and the current time.
    pub fn from_result(result: &DeployResult, target: DeploymentTarget, domain: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            target,
            status: if result.success {
                DeployStatus::Success
            } else {
                DeployStatus::Failed
            },
            url: result.url.clone(),
            duration_ms: result.duration_ms,
            timestamp: Utc::now(),
            dns_updated: result.dns_updated,
            dns_error: result.dns_error.clone(),
            error: result.error.clone(),
        }
    }
}

/// Filter for listing history. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    #[serde(default)]
    pub target: Option<DeploymentTarget>,
    #[serde(default)]
    pub status: Option<DeployStatus>,
    /// Case-insensitive exact domain match.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &DeploymentRecord) -> bool {
        self.target.is_none_or(|t| t == record.target)
            && self.status.is_none_or(|s| s == record.status)
            && self
                .domain
                .as_deref()
                .is_none_or(|d| d.eq_ignore_ascii_case(&record.domain))
    }
}

/// Aggregates over the retained history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStats {
    pub total: u64,
    pub success_count: u64,
    pub failed_count: u64,
    /// Percentage with one decimal.
    pub success_rate: f64,
    #[serde(rename = "last24h")]
    pub last_24h: u64,
    pub last_week: u64,
    /// Mean over successful attempts with a non-zero duration.
    pub avg_duration_ms: u64,
    pub by_target: BTreeMap<DeploymentTarget, u64>,
}
