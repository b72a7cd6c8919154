//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

pub use deploy_orchestrator_provider::ProviderError;
pub use deploy_orchestrator_toolbox::ToolboxError;

use deploy_orchestrator_provider::UnknownTarget;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Unknown target, missing or mismatched credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input rejected before any network I/O
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No zone on the DNS account matches the domain
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The site catalog does not know the site
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    /// A workflow step's validator does not hold yet
    #[error("Step {step} ({title}) is incomplete: missing {}", missing.join(", "))]
    StepBlocked {
        step: usize,
        title: String,
        missing: Vec<String>,
    },

    /// One or more records of a post-deploy DNS update failed
    #[error("DNS update failed ({count}): {detail}")]
    DnsSync { count: usize, detail: String },

    /// Domain registrar error
    #[error("Registration error: {0}")]
    Registration(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// DoH lookup error
    #[error("{0}")]
    Toolbox(#[from] ToolboxError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, missing resource, ...), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Configuration(_)
            | Self::ValidationError(_)
            | Self::ZoneNotFound(_)
            | Self::SiteNotFound(_)
            | Self::StepBlocked { .. } => true,
            Self::Provider(e) => e.is_expected(),
            Self::Toolbox(e) => matches!(e, ToolboxError::ValidationError(_)),
            _ => false,
        }
    }
}

impl From<UnknownTarget> for CoreError {
    fn from(e: UnknownTarget) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_blocked_lists_missing_keys() {
        let e = CoreError::StepBlocked {
            step: 1,
            title: "Select Domain".to_string(),
            missing: vec!["domainId".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "Step 1 (Select Domain) is incomplete: missing domainId"
        );
        assert!(e.is_expected());
    }

    #[test]
    fn unknown_target_is_configuration() {
        let e: CoreError = UnknownTarget("vercel".to_string()).into();
        assert_eq!(
            e.to_string(),
            "Configuration error: Unknown deploy target: vercel"
        );
    }

    #[test]
    fn provider_expectedness_is_forwarded() {
        let e = CoreError::from(ProviderError::NetworkError {
            provider: "netlify".to_string(),
            detail: "reset".to_string(),
        });
        assert!(!e.is_expected());
    }
}
