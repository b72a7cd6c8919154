//! Domain registrar boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Confirmation of a completed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub domain: String,
    /// Registrar order or transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Registers domains and points them at the DNS host.
#[async_trait]
pub trait DomainRegistrar: Send + Sync {
    /// `false` when domains are registered out of band and the check/register
    /// steps are skipped.
    fn handles_registration(&self) -> bool {
        true
    }

    async fn check_availability(&self, domain: &str) -> CoreResult<bool>;

    async fn register(&self, domain: &str) -> CoreResult<RegistrationReceipt>;

    async fn update_nameservers(&self, domain: &str, nameservers: &[String]) -> CoreResult<()>;
}

/// Registrar for domains bought and delegated by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualRegistrar;

#[async_trait]
impl DomainRegistrar for ManualRegistrar {
    fn handles_registration(&self) -> bool {
        false
    }

    async fn check_availability(&self, domain: &str) -> CoreResult<bool> {
        Err(CoreError::Registration(format!(
            "No registrar configured; check {domain} at your registrar"
        )))
    }

    async fn register(&self, domain: &str) -> CoreResult<RegistrationReceipt> {
        Err(CoreError::Registration(format!(
            "No registrar configured; register {domain} at your registrar"
        )))
    }

    async fn update_nameservers(&self, domain: &str, nameservers: &[String]) -> CoreResult<()> {
        log::info!(
            "Set the nameservers of {domain} to {} at your registrar",
            nameservers.join(", ")
        );
        Ok(())
    }
}
