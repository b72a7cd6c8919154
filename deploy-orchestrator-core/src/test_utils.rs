//! Test helpers
//!
//! Mock collaborators plus a harness that wires them into a `ServiceContext`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use deploy_orchestrator_provider::{
    Artifact, DeployCredentials, DeploymentTarget, DnsCredentials, DnsProvider, DnsRecord,
    DnsRecordInput, DnsTarget, ProviderError, PublishOutcome, SiteContext, TargetAdapter, Zone,
    ZoneStatus,
};
use deploy_orchestrator_toolbox::{DnsQueryType, PropagationCheckResult, PropagationVerdict};

use crate::error::{CoreError, CoreResult};
use crate::services::{
    DeploymentDispatcher, DeploymentHistoryService, DnsRecordService, QuickActionExecutor,
    ServiceContext,
};
use crate::traits::{
    DeploymentHistoryRepository, DnsProviderFactory, DomainRegistrar,
    InMemorySnapshotRepository, PropagationVerifier, RegistrationReceipt, SiteCatalog,
    TargetAdapterFactory,
};
use crate::types::DeploymentRecord;

// ===== MockDnsProvider =====

#[derive(Default)]
pub struct MockDnsProvider {
    zones: RwLock<HashMap<String, Zone>>,
    records: RwLock<HashMap<String, Vec<DnsRecord>>>,
    /// Record names whose creation is rejected
    failing_names: RwLock<HashSet<String>>,
    next_id: AtomicUsize,
    writes: AtomicUsize,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_zone(&self, id: &str, name: &str) {
        self.zones.write().await.insert(
            id.to_string(),
            Zone {
                id: id.to_string(),
                name: name.to_string(),
                status: ZoneStatus::Active,
                name_servers: vec![],
            },
        );
    }

    /// Seed a record without counting it as a write.
    pub async fn add_record(&self, zone_id: &str, input: DnsRecordInput) {
        let record = self.to_record(zone_id, &input);
        self.records
            .write()
            .await
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
    }

    pub async fn records(&self, zone_id: &str) -> Vec<DnsRecord> {
        self.records
            .read()
            .await
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn fail_creates_for(&self, name: &str) {
        self.failing_names.write().await.insert(name.to_string());
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn to_record(&self, zone_id: &str, input: &DnsRecordInput) -> DnsRecord {
        DnsRecord {
            id: self.next_id("rec"),
            zone_id: zone_id.to_string(),
            record_type: input.record_type,
            name: input.name.clone(),
            content: input.content.clone(),
            ttl: input.ttl,
            proxied: input.proxied,
            priority: input.priority,
            created_at: None,
            modified_at: None,
        }
    }
}

fn not_found(record_id: &str) -> ProviderError {
    ProviderError::RecordNotFound {
        provider: "mock".to_string(),
        record_id: record_id.to_string(),
        raw_message: None,
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn validate_credentials(&self) -> deploy_orchestrator_provider::Result<bool> {
        Ok(true)
    }

    async fn find_zone(&self, domain: &str) -> deploy_orchestrator_provider::Result<Option<Zone>> {
        Ok(self
            .zones
            .read()
            .await
            .values()
            .find(|z| z.name.eq_ignore_ascii_case(domain))
            .cloned())
    }

    async fn get_zone(&self, zone_id: &str) -> deploy_orchestrator_provider::Result<Zone> {
        self.zones
            .read()
            .await
            .get(zone_id)
            .cloned()
            .ok_or_else(|| ProviderError::ZoneNotFound {
                provider: "mock".to_string(),
                domain: zone_id.to_string(),
                raw_message: None,
            })
    }

    async fn create_zone(&self, domain: &str) -> deploy_orchestrator_provider::Result<Zone> {
        let zone = Zone {
            id: self.next_id("zone"),
            name: domain.to_string(),
            status: ZoneStatus::Pending,
            name_servers: vec![
                "ada.ns.cloudflare.com".to_string(),
                "bob.ns.cloudflare.com".to_string(),
            ],
        };
        self.zones.write().await.insert(zone.id.clone(), zone.clone());
        Ok(zone)
    }

    async fn list_records(
        &self,
        zone_id: &str,
    ) -> deploy_orchestrator_provider::Result<Vec<DnsRecord>> {
        Ok(self.records(zone_id).await)
    }

    async fn create_record(
        &self,
        zone_id: &str,
        input: &DnsRecordInput,
    ) -> deploy_orchestrator_provider::Result<DnsRecord> {
        if self.failing_names.read().await.contains(&input.name) {
            return Err(ProviderError::InvalidParameter {
                provider: "mock".to_string(),
                param: "name".to_string(),
                detail: format!("{} rejected", input.name),
            });
        }
        let record = self.to_record(zone_id, input);
        self.records
            .write()
            .await
            .entry(zone_id.to_string())
            .or_default()
            .push(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        input: &DnsRecordInput,
    ) -> deploy_orchestrator_provider::Result<DnsRecord> {
        let mut store = self.records.write().await;
        let record = store
            .get_mut(zone_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| not_found(record_id))?;
        record.record_type = input.record_type;
        record.name.clone_from(&input.name);
        record.content.clone_from(&input.content);
        record.ttl = input.ttl;
        record.proxied = input.proxied;
        record.priority = input.priority;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete_record(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> deploy_orchestrator_provider::Result<()> {
        let mut store = self.records.write().await;
        let records = store.get_mut(zone_id).ok_or_else(|| not_found(record_id))?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(not_found(record_id));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockDnsProviderFactory(pub Arc<MockDnsProvider>);

impl DnsProviderFactory for MockDnsProviderFactory {
    fn create(&self, _credentials: &DnsCredentials) -> CoreResult<Arc<dyn DnsProvider>> {
        Ok(self.0.clone())
    }
}

// ===== MockTargetAdapters =====

#[derive(Default)]
struct AdapterState {
    dns_target: RwLock<Option<DnsTarget>>,
    failure: RwLock<Option<String>>,
    last_artifact: RwLock<Option<Artifact>>,
    publishes: AtomicUsize,
}

/// Adapter factory whose adapters share one scripted state.
#[derive(Default)]
pub struct MockTargetAdapters {
    state: Arc<AdapterState>,
}

impl MockTargetAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_dns_target(&self, target: Option<DnsTarget>) {
        *self.state.dns_target.write().await = target;
    }

    pub async fn fail_with(&self, message: &str) {
        *self.state.failure.write().await = Some(message.to_string());
    }

    pub fn publish_count(&self) -> usize {
        self.state.publishes.load(Ordering::SeqCst)
    }

    pub async fn last_artifact(&self) -> Option<Artifact> {
        self.state.last_artifact.read().await.clone()
    }
}

impl TargetAdapterFactory for MockTargetAdapters {
    fn create(&self, credentials: DeployCredentials) -> CoreResult<Arc<dyn TargetAdapter>> {
        credentials.validate()?;
        Ok(Arc::new(MockTargetAdapter {
            target: credentials.target(),
            state: self.state.clone(),
        }))
    }
}

struct MockTargetAdapter {
    target: DeploymentTarget,
    state: Arc<AdapterState>,
}

#[async_trait]
impl TargetAdapter for MockTargetAdapter {
    fn target(&self) -> DeploymentTarget {
        self.target
    }

    async fn publish(
        &self,
        artifact: &Artifact,
        site: &SiteContext,
    ) -> deploy_orchestrator_provider::Result<PublishOutcome> {
        self.state.publishes.fetch_add(1, Ordering::SeqCst);
        *self.state.last_artifact.write().await = Some(artifact.clone());
        if let Some(message) = self.state.failure.read().await.clone() {
            return Err(ProviderError::PublishRejected {
                provider: self.target.slug().to_string(),
                step: "upload".to_string(),
                status: 422,
                raw_message: message,
            });
        }
        Ok(PublishOutcome {
            url: format!("https://{}.{}.test", site.slug(), self.target.slug()),
            deployment_id: Some("dep-1".to_string()),
            dns_target: self.state.dns_target.read().await.clone(),
        })
    }
}

// ===== MockPropagation =====

/// Every resolver answers with the scripted values.
#[derive(Default)]
pub struct MockPropagation {
    answers: RwLock<Vec<String>>,
}

impl MockPropagation {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_answers(&self, answers: Vec<String>) {
        *self.answers.write().await = answers;
    }
}

#[async_trait]
impl PropagationVerifier for MockPropagation {
    async fn verify(
        &self,
        hostname: &str,
        record_type: DnsQueryType,
        expected: Option<&str>,
    ) -> CoreResult<PropagationVerdict> {
        let answers = self.answers.read().await.clone();
        let matches =
            !answers.is_empty() && expected.is_none_or(|e| answers.iter().any(|a| a == e));
        Ok(PropagationVerdict {
            hostname: hostname.to_string(),
            record_type,
            expected: expected.map(str::to_string),
            propagated: matches,
            per_server: vec![PropagationCheckResult {
                server: "Mock".to_string(),
                success: !answers.is_empty(),
                observed_value: answers.first().cloned(),
                matches,
                error: None,
                response_time_ms: 1,
            }],
            total_time_ms: 1,
        })
    }

    async fn resolve_host(
        &self,
        _hostname: &str,
        _record_type: DnsQueryType,
    ) -> CoreResult<Vec<String>> {
        Ok(self.answers.read().await.clone())
    }
}

// ===== MockSiteCatalog =====

#[derive(Default)]
pub struct MockSiteCatalog {
    sites: RwLock<Vec<SiteContext>>,
}

impl MockSiteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_site(&self, site: SiteContext) {
        self.sites.write().await.push(site);
    }
}

#[async_trait]
impl SiteCatalog for MockSiteCatalog {
    async fn find_site(&self, key: &str) -> CoreResult<Option<SiteContext>> {
        let sites = self.sites.read().await;
        Ok(sites
            .iter()
            .find(|s| s.site_id == key)
            .or_else(|| {
                sites
                    .iter()
                    .find(|s| s.domain.as_deref().is_some_and(|d| d.eq_ignore_ascii_case(key)))
            })
            .cloned())
    }

    async fn render_artifact(&self, site: &SiteContext) -> CoreResult<Artifact> {
        Ok(Artifact::single_page(format!("<h1>{}</h1>", site.site_id)))
    }
}

// ===== MockRegistrar =====

pub struct MockRegistrar {
    available: RwLock<bool>,
    fail_nameservers: RwLock<bool>,
    registered: RwLock<Vec<String>>,
    nameserver_updates: AtomicUsize,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self {
            available: RwLock::new(true),
            fail_nameservers: RwLock::new(false),
            registered: RwLock::new(Vec::new()),
            nameserver_updates: AtomicUsize::new(0),
        }
    }

    pub async fn set_available(&self, available: bool) {
        *self.available.write().await = available;
    }

    pub async fn fail_nameservers(&self, fail: bool) {
        *self.fail_nameservers.write().await = fail;
    }

    pub async fn registered(&self) -> Vec<String> {
        self.registered.read().await.clone()
    }

    pub fn nameserver_updates(&self) -> usize {
        self.nameserver_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DomainRegistrar for MockRegistrar {
    async fn check_availability(&self, _domain: &str) -> CoreResult<bool> {
        Ok(*self.available.read().await)
    }

    async fn register(&self, domain: &str) -> CoreResult<RegistrationReceipt> {
        self.registered.write().await.push(domain.to_string());
        Ok(RegistrationReceipt {
            domain: domain.to_string(),
            order_id: Some("order-1".to_string()),
        })
    }

    async fn update_nameservers(&self, domain: &str, _nameservers: &[String]) -> CoreResult<()> {
        if *self.fail_nameservers.read().await {
            return Err(CoreError::Registration(format!(
                "Nameserver update rejected for {domain}"
            )));
        }
        self.nameserver_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ===== MockHistoryRepository =====

#[derive(Default)]
pub struct MockHistoryRepository {
    records: RwLock<Vec<DeploymentRecord>>,
    /// If Some, save returns this error
    save_error: RwLock<Option<String>>,
    /// If Some, load returns this error
    load_error: RwLock<Option<String>>,
    loads: AtomicUsize,
}

impl MockHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_save_error(&self, err: Option<&str>) {
        *self.save_error.write().await = err.map(str::to_string);
    }

    pub async fn set_load_error(&self, err: Option<&str>) {
        *self.load_error.write().await = err.map(str::to_string);
    }

    /// Seed the persisted list without going through a service.
    pub async fn seed(&self, records: Vec<DeploymentRecord>) {
        *self.records.write().await = records;
    }

    pub async fn stored(&self) -> Vec<DeploymentRecord> {
        self.records.read().await.clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeploymentHistoryRepository for MockHistoryRepository {
    async fn load(&self) -> CoreResult<Vec<DeploymentRecord>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(ref msg) = *self.load_error.read().await {
            return Err(CoreError::SerializationError(msg.clone()));
        }
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, records: &[DeploymentRecord]) -> CoreResult<()> {
        if let Some(ref msg) = *self.save_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}

// ===== Harness =====

/// All mocks plus the context built from them.
pub struct TestHarness {
    pub dns: Arc<MockDnsProvider>,
    pub adapters: Arc<MockTargetAdapters>,
    pub propagation: Arc<MockPropagation>,
    pub sites: Arc<MockSiteCatalog>,
    pub registrar: Arc<MockRegistrar>,
    pub history: Arc<MockHistoryRepository>,
    ctx: Arc<ServiceContext>,
}

impl TestHarness {
    pub fn new() -> Self {
        let dns = Arc::new(MockDnsProvider::new());
        let adapters = Arc::new(MockTargetAdapters::new());
        let propagation = Arc::new(MockPropagation::new());
        let sites = Arc::new(MockSiteCatalog::new());
        let registrar = Arc::new(MockRegistrar::new());
        let history = Arc::new(MockHistoryRepository::new());

        let ctx = Arc::new(ServiceContext::new(
            adapters.clone(),
            Arc::new(MockDnsProviderFactory(dns.clone())),
            propagation.clone(),
            history.clone(),
            Arc::new(InMemorySnapshotRepository::new()),
            sites.clone(),
            registrar.clone(),
        ));

        Self {
            dns,
            adapters,
            propagation,
            sites,
            registrar,
            history,
            ctx,
        }
    }

    pub fn ctx(&self) -> Arc<ServiceContext> {
        self.ctx.clone()
    }

    pub fn dns_credentials(&self) -> DnsCredentials {
        DnsCredentials {
            account_id: "0123456789abcdef0123456789abcdef".to_string(),
            api_token: "test-token-12345".to_string(),
        }
    }

    /// A dispatcher with its own history service over the shared repository.
    pub fn dispatcher(&self) -> Arc<DeploymentDispatcher> {
        let ctx = self.ctx();
        Arc::new(DeploymentDispatcher::new(
            ctx.clone(),
            Arc::new(DnsRecordService::new(ctx.clone())),
            Arc::new(DeploymentHistoryService::new(ctx)),
        ))
    }

    pub fn executor(&self) -> QuickActionExecutor {
        let ctx = self.ctx();
        QuickActionExecutor::new(
            ctx.clone(),
            self.dispatcher(),
            Arc::new(DnsRecordService::new(ctx)),
        )
    }
}
