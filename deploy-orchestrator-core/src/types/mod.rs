//! Type definitions

mod credentials;
mod deploy;
mod dns;
mod history;
mod workflow;

pub use credentials::CredentialSet;
pub use deploy::{DeployResult, DispatchRequest, DnsSyncOptions};
pub use dns::{DnsSnapshot, TemplateApplyResult, TemplateFailure, UpsertAction, UpsertOutcome};
pub use history::{DeployStatus, DeploymentRecord, DeploymentStats, HistoryFilter};
pub use workflow::{QuickAction, StepValidator, WorkflowData, WorkflowState, WorkflowStep};

// Re-export provider and toolbox types used across the core API
pub use deploy_orchestrator_provider::{
    Artifact, DeployCredentials, DeploymentTarget, DnsCredentials, DnsRecord, DnsRecordInput,
    DnsRecordType, DnsTarget, PublishOutcome, SiteContext, Ttl, Zone, ZoneStatus,
};
pub use deploy_orchestrator_toolbox::{DnsQueryType, PropagationCheckResult, PropagationVerdict};
