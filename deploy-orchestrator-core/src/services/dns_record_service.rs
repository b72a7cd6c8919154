//! DNS record management service

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::Utc;

use deploy_orchestrator_provider::{
    DnsCredentials, DnsProvider, DnsRecord, DnsRecordInput, DnsRecordType, DnsTarget, Ttl, Zone,
};
use deploy_orchestrator_toolbox::DnsQueryType;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{DnsSnapshot, TemplateApplyResult, TemplateFailure, UpsertAction, UpsertOutcome};
use crate::utils::validation::{normalize_domain, validate_record};

/// TTL of records written after a deploy when not proxied.
const DEPLOY_RECORD_TTL: Ttl = Ttl::Seconds(3600);

/// Proxied placeholder for targets the edge routes by hostname.
const ORIGINLESS_ADDRESS: Ipv6Addr = Ipv6Addr::new(0x100, 0, 0, 0, 0, 0, 0, 0);

/// DNS record management service
///
/// Every write validates and sanitizes the record first; invalid input never
/// reaches the provider.
pub struct DnsRecordService {
    ctx: Arc<ServiceContext>,
}

impl DnsRecordService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Check the account's API token.
    pub async fn validate_credentials(&self, credentials: &DnsCredentials) -> CoreResult<bool> {
        let provider = self.ctx.get_dns_provider(credentials)?;
        Ok(provider.validate_credentials().await?)
    }

    /// Exact zone-name lookup on the account.
    pub async fn find_zone_by_domain(
        &self,
        credentials: &DnsCredentials,
        domain: &str,
    ) -> CoreResult<Zone> {
        let domain = normalize_domain(domain)?;
        let provider = self.ctx.get_dns_provider(credentials)?;
        provider
            .find_zone(&domain)
            .await?
            .ok_or(CoreError::ZoneNotFound(domain))
    }

    /// Add the domain to the account.
    pub async fn create_zone(&self, credentials: &DnsCredentials, domain: &str) -> CoreResult<Zone> {
        let domain = normalize_domain(domain)?;
        let provider = self.ctx.get_dns_provider(credentials)?;
        Ok(provider.create_zone(&domain).await?)
    }

    pub async fn find_or_create_zone(
        &self,
        credentials: &DnsCredentials,
        domain: &str,
    ) -> CoreResult<Zone> {
        match self.find_zone_by_domain(credentials, domain).await {
            Ok(zone) => Ok(zone),
            Err(CoreError::ZoneNotFound(domain)) => {
                log::info!("No zone for {domain}, creating it");
                self.create_zone(credentials, &domain).await
            }
            Err(e) => Err(e),
        }
    }

    /// Every record of the zone. The result is kept as the zone's snapshot.
    pub async fn list_records(
        &self,
        credentials: &DnsCredentials,
        zone_id: &str,
    ) -> CoreResult<Vec<DnsRecord>> {
        let provider = self.ctx.get_dns_provider(credentials)?;
        self.fetch_records(provider.as_ref(), zone_id).await
    }

    /// Records from the last listing of the zone, without network I/O.
    pub async fn cached_records(&self, zone_id: &str) -> CoreResult<Option<DnsSnapshot>> {
        self.ctx.snapshot_repository.find(zone_id).await
    }

    pub async fn create_record(
        &self,
        credentials: &DnsCredentials,
        zone_id: &str,
        input: &DnsRecordInput,
    ) -> CoreResult<DnsRecord> {
        let record = validate_record(input)?;
        let provider = self.ctx.get_dns_provider(credentials)?;
        Ok(provider.create_record(zone_id, &record).await?)
    }

    pub async fn update_record(
        &self,
        credentials: &DnsCredentials,
        zone_id: &str,
        record_id: &str,
        input: &DnsRecordInput,
    ) -> CoreResult<DnsRecord> {
        let record = validate_record(input)?;
        let provider = self.ctx.get_dns_provider(credentials)?;
        Ok(provider.update_record(zone_id, record_id, &record).await?)
    }

    pub async fn delete_record(
        &self,
        credentials: &DnsCredentials,
        zone_id: &str,
        record_id: &str,
    ) -> CoreResult<()> {
        if record_id.trim().is_empty() {
            return Err(CoreError::ValidationError("Record id is required".to_string()));
        }
        let provider = self.ctx.get_dns_provider(credentials)?;
        Ok(provider.delete_record(zone_id, record_id).await?)
    }

    /// Create or update the record with the same name and type.
    ///
    /// An identical record is returned as is, without a write.
    pub async fn upsert_record(
        &self,
        credentials: &DnsCredentials,
        zone: &Zone,
        input: &DnsRecordInput,
    ) -> CoreResult<UpsertOutcome> {
        let record = prepare_for_zone(zone, input)?;
        let provider = self.ctx.get_dns_provider(credentials)?;
        let existing = self.fetch_records(provider.as_ref(), &zone.id).await?;

        let candidates: Vec<&DnsRecord> = existing
            .iter()
            .filter(|r| {
                r.record_type == record.record_type && r.name.eq_ignore_ascii_case(&record.name)
            })
            .collect();

        if let Some(same) = candidates.iter().find(|r| record.matches_record(r)) {
            log::debug!(
                "{} {} in {} already up to date",
                record.record_type,
                record.name,
                zone.name
            );
            return Ok(UpsertOutcome {
                action: UpsertAction::Unchanged,
                record: (*same).clone(),
            });
        }

        if let Some(current) = candidates.first() {
            let updated = provider
                .update_record(&zone.id, &current.id, &record)
                .await?;
            log::info!(
                "Updated {} {} in {}: {} -> {}",
                record.record_type,
                record.name,
                zone.name,
                current.content,
                updated.content
            );
            return Ok(UpsertOutcome {
                action: UpsertAction::Updated,
                record: updated,
            });
        }

        let created = provider.create_record(&zone.id, &record).await?;
        log::info!(
            "Created {} {} in {} -> {}",
            record.record_type,
            record.name,
            zone.name,
            created.content
        );
        Ok(UpsertOutcome {
            action: UpsertAction::Created,
            record: created,
        })
    }

    /// Create every record not already present, reporting each outcome.
    ///
    /// Invalid records and provider rejections land in `failed`; the rest are still applied.
    pub async fn apply_template(
        &self,
        credentials: &DnsCredentials,
        zone: &Zone,
        records: &[DnsRecordInput],
    ) -> CoreResult<TemplateApplyResult> {
        let provider = self.ctx.get_dns_provider(credentials)?;
        let existing = self.fetch_records(provider.as_ref(), &zone.id).await?;

        let mut result = TemplateApplyResult::default();
        let mut pending = Vec::new();
        for input in records {
            match prepare_for_zone(zone, input) {
                Err(e) => result.failed.push(TemplateFailure {
                    name: input.name.clone(),
                    record_type: input.record_type,
                    reason: e.to_string(),
                }),
                Ok(record) if existing.iter().any(|r| record.matches_record(r)) => {
                    result.skipped += 1;
                }
                Ok(record) => pending.push(record),
            }
        }

        if !pending.is_empty() {
            let batch = provider.batch_create_records(&zone.id, &pending).await;
            result.created = batch.created_records.len();
            result.records = batch.created_records;
            result
                .failed
                .extend(batch.failures.into_iter().map(|f| TemplateFailure {
                    name: f.record_name,
                    record_type: f.record_type,
                    reason: f.reason,
                }));
        }

        log::info!(
            "Template applied to {}: {} created, {} skipped, {} failed",
            zone.name,
            result.created,
            result.skipped,
            result.failed.len()
        );
        Ok(result)
    }

    /// Point the apex of `domain` at a fresh deployment.
    ///
    /// Every record is attempted; any failure is reported as [`CoreError::DnsSync`].
    pub async fn sync_deployment(
        &self,
        credentials: &DnsCredentials,
        domain: &str,
        target: &DnsTarget,
        proxied: bool,
    ) -> CoreResult<Vec<DnsRecord>> {
        let zone = self.find_zone_by_domain(credentials, domain).await?;
        let inputs = self.deployment_records(target, proxied).await?;

        let mut applied = Vec::with_capacity(inputs.len());
        let mut errors = Vec::new();
        for input in &inputs {
            match self.upsert_record(credentials, &zone, input).await {
                Ok(outcome) => applied.push(outcome.record),
                Err(e) => errors.push(format!("{} {}: {e}", input.record_type, input.name)),
            }
        }

        if errors.is_empty() {
            log::info!("Updated {} DNS record(s) for {}", applied.len(), zone.name);
            Ok(applied)
        } else {
            Err(CoreError::DnsSync {
                count: errors.len(),
                detail: errors.join(" | "),
            })
        }
    }

    /// Records that make the apex reach `target`.
    async fn deployment_records(
        &self,
        target: &DnsTarget,
        proxied: bool,
    ) -> CoreResult<Vec<DnsRecordInput>> {
        let records = match target {
            DnsTarget::Alias {
                host,
                include_www,
                proxiable,
            } => {
                let proxied = proxied && *proxiable;
                let mut names = vec!["@"];
                if *include_www {
                    names.push("www");
                }
                names
                    .into_iter()
                    .map(|name| {
                        DnsRecordInput::new(DnsRecordType::Cname, name, host.as_str())
                            .with_ttl(DEPLOY_RECORD_TTL)
                            .with_proxied(proxied)
                    })
                    .collect()
            }
            DnsTarget::Address(ip) => vec![address_record(*ip)],
            DnsTarget::Hostname(host) => {
                let answers = self
                    .ctx
                    .propagation
                    .resolve_host(host, DnsQueryType::A)
                    .await?;
                let ip = answers
                    .iter()
                    .find_map(|a| a.parse::<Ipv4Addr>().ok())
                    .ok_or_else(|| CoreError::DnsSync {
                        count: 1,
                        detail: format!("{host} did not resolve to an IPv4 address"),
                    })?;
                log::debug!("Resolved {host} to {ip}");
                vec![address_record(IpAddr::V4(ip))]
            }
            DnsTarget::Originless => vec![DnsRecordInput::new(
                DnsRecordType::Aaaa,
                "@",
                ORIGINLESS_ADDRESS.to_string(),
            )
            .with_proxied(true)],
        };
        Ok(records)
    }

    async fn fetch_records(
        &self,
        provider: &dyn DnsProvider,
        zone_id: &str,
    ) -> CoreResult<Vec<DnsRecord>> {
        let records = provider.list_records(zone_id).await?;
        let snapshot = DnsSnapshot {
            zone_id: zone_id.to_string(),
            records: records.clone(),
            fetched_at: Utc::now(),
        };
        if let Err(e) = self.ctx.snapshot_repository.save(&snapshot).await {
            log::warn!("Failed to store DNS snapshot for zone {zone_id}: {e}");
        }
        Ok(records)
    }
}

fn address_record(ip: IpAddr) -> DnsRecordInput {
    let record_type = match ip {
        IpAddr::V4(_) => DnsRecordType::A,
        IpAddr::V6(_) => DnsRecordType::Aaaa,
    };
    DnsRecordInput::new(record_type, "@", ip.to_string())
        .with_ttl(DEPLOY_RECORD_TTL)
        .with_proxied(false)
}

/// Make the name relative to the zone, expand an apex alias target, then validate.
fn prepare_for_zone(zone: &Zone, input: &DnsRecordInput) -> CoreResult<DnsRecordInput> {
    let mut record = input.clone();
    let name = record.name.trim().trim_end_matches('.');
    let suffix = format!(".{}", zone.name);
    record.name = if name.is_empty() || name.eq_ignore_ascii_case(&zone.name) {
        "@".to_string()
    } else if name.len() > suffix.len() && name.to_ascii_lowercase().ends_with(&suffix) {
        name[..name.len() - suffix.len()].to_string()
    } else {
        name.to_string()
    };
    if record.record_type == DnsRecordType::Cname && record.content.trim() == "@" {
        record.content.clone_from(&zone.name);
    }
    validate_record(&record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_utils::TestHarness;
    use deploy_orchestrator_provider::ZoneStatus;

    fn zone() -> Zone {
        Zone {
            id: "z1".to_string(),
            name: "example.com".to_string(),
            status: ZoneStatus::Active,
            name_servers: vec![],
        }
    }

    #[test]
    fn names_become_relative_to_zone() {
        let zone = zone();
        let full = DnsRecordInput::new(DnsRecordType::A, "WWW.Example.com.", "192.0.2.1");
        assert_eq!(prepare_for_zone(&zone, &full).unwrap().name, "WWW");
        let apex = DnsRecordInput::new(DnsRecordType::A, "example.com", "192.0.2.1");
        assert_eq!(prepare_for_zone(&zone, &apex).unwrap().name, "@");
        let other = DnsRecordInput::new(DnsRecordType::A, "notexample.com", "192.0.2.1");
        assert_eq!(prepare_for_zone(&zone, &other).unwrap().name, "notexample.com");
    }

    #[test]
    fn apex_alias_expands_to_zone_name() {
        let input = DnsRecordInput::new(DnsRecordType::Cname, "www", "@");
        assert_eq!(prepare_for_zone(&zone(), &input).unwrap().content, "example.com");
    }

    #[tokio::test]
    async fn invalid_record_never_reaches_provider() {
        let h = TestHarness::new();
        let service = DnsRecordService::new(h.ctx());
        let err = service
            .create_record(
                &h.dns_credentials(),
                "z1",
                &DnsRecordInput::new(DnsRecordType::A, "@", "not-an-ip"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(h.dns.write_count(), 0);
    }

    #[tokio::test]
    async fn upsert_creates_then_is_idempotent() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        let service = DnsRecordService::new(h.ctx());
        let input = DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.1");

        let first = service
            .upsert_record(&h.dns_credentials(), &zone(), &input)
            .await
            .unwrap();
        assert_eq!(first.action, UpsertAction::Created);

        let second = service
            .upsert_record(&h.dns_credentials(), &zone(), &input)
            .await
            .unwrap();
        assert_eq!(second.action, UpsertAction::Unchanged);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(h.dns.write_count(), 1);
        assert_eq!(h.dns.records("z1").await.len(), 1);
    }

    #[tokio::test]
    async fn upsert_updates_different_content_in_place() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        h.dns
            .add_record("z1", DnsRecordInput::new(DnsRecordType::A, "WWW", "192.0.2.9"))
            .await;
        let service = DnsRecordService::new(h.ctx());

        let outcome = service
            .upsert_record(
                &h.dns_credentials(),
                &zone(),
                &DnsRecordInput::new(DnsRecordType::A, "www", "192.0.2.1"),
            )
            .await
            .unwrap();
        assert_eq!(outcome.action, UpsertAction::Updated);
        let records = h.dns.records("z1").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "192.0.2.1");
    }

    #[tokio::test]
    async fn apply_template_reports_created_skipped_failed() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        h.dns
            .add_record(
                "z1",
                DnsRecordInput::new(DnsRecordType::Cname, "www", "example.com")
                    .with_proxied(true),
            )
            .await;
        h.dns.fail_creates_for("api").await;
        let service = DnsRecordService::new(h.ctx());

        let records = vec![
            DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.1").with_proxied(true),
            DnsRecordInput::new(DnsRecordType::Cname, "www", "@").with_proxied(true),
            DnsRecordInput::new(DnsRecordType::Cname, "api", "@"),
            DnsRecordInput::new(DnsRecordType::Mx, "@", "mail.example.com"),
        ];
        let result = service
            .apply_template(&h.dns_credentials(), &zone(), &records)
            .await
            .unwrap();

        assert_eq!(result.created, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed.len(), 2);
        assert!(result.failed.iter().any(|f| f.name == "api"));
        assert!(result
            .failed
            .iter()
            .any(|f| f.record_type == DnsRecordType::Mx && f.reason.contains("priority")));
        assert!(!result.is_complete());
    }

    #[tokio::test]
    async fn zone_lookup_miss_is_zone_not_found() {
        let h = TestHarness::new();
        let service = DnsRecordService::new(h.ctx());
        let err = service
            .find_zone_by_domain(&h.dns_credentials(), "Missing.example.")
            .await
            .unwrap_err();
        let CoreError::ZoneNotFound(domain) = err else {
            panic!("expected ZoneNotFound, got {err:?}");
        };
        assert_eq!(domain, "missing.example");
    }

    #[tokio::test]
    async fn find_or_create_zone_creates_when_missing() {
        let h = TestHarness::new();
        let service = DnsRecordService::new(h.ctx());
        let zone = service
            .find_or_create_zone(&h.dns_credentials(), "new.example")
            .await
            .unwrap();
        assert_eq!(zone.name, "new.example");
        assert!(!zone.name_servers.is_empty());
        let again = service
            .find_or_create_zone(&h.dns_credentials(), "new.example")
            .await
            .unwrap();
        assert_eq!(again.id, zone.id);
    }

    #[tokio::test]
    async fn listing_stores_snapshot() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        h.dns
            .add_record("z1", DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.1"))
            .await;
        let service = DnsRecordService::new(h.ctx());

        assert!(service.cached_records("z1").await.unwrap().is_none());
        service.list_records(&h.dns_credentials(), "z1").await.unwrap();
        let snapshot = service.cached_records("z1").await.unwrap().unwrap();
        assert_eq!(snapshot.records.len(), 1);
    }

    #[tokio::test]
    async fn sync_alias_writes_apex_and_www() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        let service = DnsRecordService::new(h.ctx());

        let records = service
            .sync_deployment(
                &h.dns_credentials(),
                "example.com",
                &DnsTarget::Alias {
                    host: "site.pages.dev".to_string(),
                    include_www: true,
                    proxiable: true,
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.record_type == DnsRecordType::Cname
            && r.content == "site.pages.dev"
            && r.proxied == Some(true)
            && r.ttl == Ttl::Auto));
    }

    #[tokio::test]
    async fn sync_unproxiable_alias_ignores_proxied_option() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        let service = DnsRecordService::new(h.ctx());

        let records = service
            .sync_deployment(
                &h.dns_credentials(),
                "example.com",
                &DnsTarget::Alias {
                    host: "d111.cloudfront.net".to_string(),
                    include_www: false,
                    proxiable: false,
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].proxied, Some(false));
        assert_eq!(records[0].ttl, Ttl::Seconds(3600));
    }

    #[tokio::test]
    async fn sync_hostname_resolves_through_doh() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        h.propagation.set_answers(vec!["203.0.113.7".to_string()]).await;
        let service = DnsRecordService::new(h.ctx());

        let records = service
            .sync_deployment(
                &h.dns_credentials(),
                "example.com",
                &DnsTarget::Hostname("vps.example.net".to_string()),
                true,
            )
            .await
            .unwrap();
        assert_eq!(records[0].record_type, DnsRecordType::A);
        assert_eq!(records[0].content, "203.0.113.7");
    }

    #[tokio::test]
    async fn sync_originless_writes_proxied_placeholder() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        let service = DnsRecordService::new(h.ctx());

        let records = service
            .sync_deployment(&h.dns_credentials(), "example.com", &DnsTarget::Originless, false)
            .await
            .unwrap();
        assert_eq!(records[0].record_type, DnsRecordType::Aaaa);
        assert_eq!(records[0].content, "100::");
        assert_eq!(records[0].proxied, Some(true));
    }

    #[tokio::test]
    async fn sync_collects_every_failure() {
        let h = TestHarness::new();
        h.dns.add_zone("z1", "example.com").await;
        h.dns.fail_creates_for("@").await;
        h.dns.fail_creates_for("www").await;
        let service = DnsRecordService::new(h.ctx());

        let err = service
            .sync_deployment(
                &h.dns_credentials(),
                "example.com",
                &DnsTarget::Alias {
                    host: "site.netlify.app".to_string(),
                    include_www: true,
                    proxiable: false,
                },
                false,
            )
            .await
            .unwrap_err();
        let CoreError::DnsSync { count, .. } = err else {
            panic!("expected DnsSync, got {err:?}");
        };
        assert_eq!(count, 2);
    }
}
