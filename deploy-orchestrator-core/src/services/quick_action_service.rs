//! Quick-action executor

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use deploy_orchestrator_provider::{
    DeploymentTarget, DnsCredentials, DnsRecordInput, DnsRecordType, SiteContext, Ttl, Zone,
};
use deploy_orchestrator_toolbox::{DnsQueryType, PropagationVerdict};

use crate::error::{CoreError, CoreResult};
use crate::services::{DeploymentDispatcher, DnsRecordService, ServiceContext};
use crate::types::{
    CredentialSet, DeployResult, DispatchRequest, DnsSyncOptions, QuickAction, UpsertOutcome,
    WorkflowData,
};
use crate::utils::validation::normalize_domain;

/// Result of one executed quick action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuickActionOutcome {
    Deployed(DeployResult),
    DnsUpdated(UpsertOutcome),
    Propagation(PropagationVerdict),
    #[serde(rename_all = "camelCase")]
    SetupCompleted {
        domain: String,
        /// The domain was registered during this run.
        registered: bool,
        zone: Zone,
        /// Nameserver delegation failed; the rest of the setup went through.
        #[serde(skip_serializing_if = "Option::is_none")]
        nameserver_error: Option<String>,
        deploy: DeployResult,
    },
}

impl QuickActionOutcome {
    pub fn success(&self) -> bool {
        match self {
            Self::Deployed(result) => result.success,
            Self::DnsUpdated(_) => true,
            Self::Propagation(verdict) => verdict.propagated,
            Self::SetupCompleted { deploy, .. } => deploy.success,
        }
    }
}

/// Runs a finished wizard's data against the dispatcher, the DNS service
/// and the propagation checker.
pub struct QuickActionExecutor {
    ctx: Arc<ServiceContext>,
    dispatcher: Arc<DeploymentDispatcher>,
    dns: Arc<DnsRecordService>,
}

impl QuickActionExecutor {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        dispatcher: Arc<DeploymentDispatcher>,
        dns: Arc<DnsRecordService>,
    ) -> Self {
        Self {
            ctx,
            dispatcher,
            dns,
        }
    }

    /// Execute `action` with the collected `data`.
    ///
    /// Every step's required keys are checked again first, so data assembled
    /// outside the wizard gets the same [`CoreError::StepBlocked`] report.
    pub async fn execute(
        &self,
        action: QuickAction,
        data: &WorkflowData,
        credentials: &CredentialSet,
    ) -> CoreResult<QuickActionOutcome> {
        for (index, step) in action.steps().iter().enumerate() {
            let missing = step.validator.missing(data);
            if !missing.is_empty() {
                return Err(CoreError::StepBlocked {
                    step: index + 1,
                    title: step.title.to_string(),
                    missing: missing.into_iter().map(str::to_string).collect(),
                });
            }
        }

        log::info!("Executing quick action {action}");
        match action {
            QuickAction::DeployDns => self.deploy_dns(data, credentials).await,
            QuickAction::DnsOnly => self.dns_only(data, credentials).await,
            QuickAction::TestDns => self.test_dns(data).await,
            QuickAction::QuickSetup => self.quick_setup(data, credentials).await,
        }
    }

    async fn deploy_dns(
        &self,
        data: &WorkflowData,
        credentials: &CredentialSet,
    ) -> CoreResult<QuickActionOutcome> {
        let site = self.site(required_str(data, "domainId")?).await?;
        let target: DeploymentTarget = required_str(data, "target")?.parse()?;

        let dns = if bool_or(data, "updateDns", true) {
            dns_options(data, credentials, site.domain.is_some())?
        } else {
            None
        };

        let result = self.dispatch(target, site, credentials, dns).await?;
        Ok(QuickActionOutcome::Deployed(result))
    }

    async fn dns_only(
        &self,
        data: &WorkflowData,
        credentials: &CredentialSet,
    ) -> CoreResult<QuickActionOutcome> {
        let key = required_str(data, "domainId")?;
        let site = self.site(key).await?;
        let domain = site
            .domain
            .ok_or_else(|| CoreError::ValidationError(format!("Site {key} has no domain")))?;
        let account = dns_account(data, credentials)?;

        let record_type: DnsRecordType = required_str(data, "recordType")?.parse()?;
        let mut input = DnsRecordInput::new(
            record_type,
            required_str(data, "name")?,
            required_str(data, "content")?,
        );
        input.ttl = ttl(data)?;
        input.proxied = data.get("proxied").and_then(Value::as_bool);
        input.priority = match data.get("priority") {
            None | Some(Value::Null) => None,
            Some(value) => Some(as_u16(value, "priority")?),
        };

        let zone = self.dns.find_zone_by_domain(account, &domain).await?;
        let outcome = self.dns.upsert_record(account, &zone, &input).await?;
        Ok(QuickActionOutcome::DnsUpdated(outcome))
    }

    async fn test_dns(&self, data: &WorkflowData) -> CoreResult<QuickActionOutcome> {
        let hostname = normalize_domain(required_str(data, "hostname")?)?;
        let record_type: DnsQueryType = optional_str(data, "recordType")
            .map(str::parse)
            .transpose()?
            .unwrap_or(DnsQueryType::A);
        let expected = optional_str(data, "expected");

        let verdict = self
            .ctx
            .propagation
            .verify(&hostname, record_type, expected)
            .await?;
        log::info!(
            "{record_type} {hostname}: {}/{} resolver(s) agree",
            verdict.matching_count(),
            verdict.per_server.len()
        );
        Ok(QuickActionOutcome::Propagation(verdict))
    }

    async fn quick_setup(
        &self,
        data: &WorkflowData,
        credentials: &CredentialSet,
    ) -> CoreResult<QuickActionOutcome> {
        let domain = normalize_domain(required_str(data, "domain")?)?;
        let target: DeploymentTarget = required_str(data, "target")?.parse()?;
        let account = dns_account(data, credentials)?;

        let registered = if bool_or(data, "registered", false) {
            log::debug!("{domain} marked as already registered");
            false
        } else if self.ctx.registrar.handles_registration() {
            if !self.ctx.registrar.check_availability(&domain).await? {
                return Err(CoreError::Registration(format!(
                    "Domain not available: {domain}"
                )));
            }
            let receipt = self.ctx.registrar.register(&domain).await?;
            log::info!(
                "Registered {domain} (order {})",
                receipt.order_id.as_deref().unwrap_or("n/a")
            );
            true
        } else {
            false
        };

        let zone = self.dns.find_or_create_zone(account, &domain).await?;

        let nameserver_error = if zone.name_servers.is_empty() {
            None
        } else {
            match self
                .ctx
                .registrar
                .update_nameservers(&domain, &zone.name_servers)
                .await
            {
                Ok(()) => None,
                Err(e) => {
                    log::warn!("Nameserver update for {domain} failed: {e}");
                    Some(e.to_string())
                }
            }
        };

        let key = optional_str(data, "siteId").unwrap_or(&domain);
        let site = self.site(key).await?.with_domain(domain.as_str());
        let dns = DnsSyncOptions::new(account.clone()).with_proxied(bool_or(data, "proxied", true));
        let deploy = self.dispatch(target, site, credentials, Some(dns)).await?;

        Ok(QuickActionOutcome::SetupCompleted {
            domain,
            registered,
            zone,
            nameserver_error,
            deploy,
        })
    }

    async fn site(&self, key: &str) -> CoreResult<SiteContext> {
        self.ctx
            .site_catalog
            .find_site(key)
            .await?
            .ok_or_else(|| CoreError::SiteNotFound(key.to_string()))
    }

    async fn dispatch(
        &self,
        target: DeploymentTarget,
        site: SiteContext,
        credentials: &CredentialSet,
        dns: Option<DnsSyncOptions>,
    ) -> CoreResult<DeployResult> {
        let deploy = credentials.deploy_for(target)?;
        let artifact = self.ctx.site_catalog.render_artifact(&site).await?;
        let mut request = DispatchRequest::new(artifact, site, deploy).with_target(target);
        request.dns = dns;
        Ok(self.dispatcher.dispatch(request).await)
    }
}

/// DNS options for a deploy, or `None` when no account is configured.
fn dns_options(
    data: &WorkflowData,
    credentials: &CredentialSet,
    has_domain: bool,
) -> CoreResult<Option<DnsSyncOptions>> {
    if !has_domain {
        return Ok(None);
    }
    if !credentials.has_dns() {
        log::warn!("No DNS account configured, deploying without a DNS update");
        return Ok(None);
    }
    let account = dns_account(data, credentials)?;
    Ok(Some(
        DnsSyncOptions::new(account.clone()).with_proxied(bool_or(data, "proxied", true)),
    ))
}

fn dns_account<'a>(
    data: &WorkflowData,
    credentials: &'a CredentialSet,
) -> CoreResult<&'a DnsCredentials> {
    credentials.dns_account(optional_str(data, "dnsAccountId"))
}

fn optional_str<'a>(data: &'a WorkflowData, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required_str<'a>(data: &'a WorkflowData, key: &str) -> CoreResult<&'a str> {
    optional_str(data, key)
        .ok_or_else(|| CoreError::ValidationError(format!("'{key}' must be a non-empty string")))
}

/// Booleans may also arrive as `"true"`/`"false"` strings.
fn bool_or(data: &WorkflowData, key: &str, default: bool) -> bool {
    match data.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn as_u16(value: &Value, key: &str) -> CoreResult<u16> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CoreError::ValidationError(format!("'{key}' must be a number")))
}

fn ttl(data: &WorkflowData) -> CoreResult<Ttl> {
    match data.get("ttl") {
        None | Some(Value::Null) => Ok(Ttl::Auto),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Ttl::Seconds)
            .ok_or_else(|| CoreError::ValidationError("'ttl' must be 'auto' or seconds".to_string())),
        Some(Value::String(s)) => Ok(s.parse()?),
        Some(_) => Err(CoreError::ValidationError(
            "'ttl' must be 'auto' or seconds".to_string(),
        )),
    }
}
