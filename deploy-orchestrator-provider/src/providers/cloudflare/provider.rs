//! Cloudflare `DnsProvider` implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ProviderError, Result};
use crate::providers::common::{full_name_to_relative, relative_to_full_name};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{DnsRecord, DnsRecordInput, DnsRecordType, Ttl, Zone, ZoneStatus};

use super::types::{
    AccountRef, CloudflareCaaData, CloudflareRecordBody, CloudflareSrvData, CreateZoneBody,
};
use super::{CloudflareDnsClient, CloudflareDnsRecord, CloudflareZone, MAX_PAGE_SIZE_RECORDS};

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

impl CloudflareDnsClient {
    /// Cloudflare zone statuses: active, pending, initializing, moved.
    pub(crate) fn cf_zone_to_zone(zone: CloudflareZone) -> Zone {
        let status = match zone.status.as_str() {
            "active" => ZoneStatus::Active,
            "pending" | "initializing" => ZoneStatus::Pending,
            "moved" => ZoneStatus::Moved,
            _ => ZoneStatus::Unknown,
        };
        Zone {
            id: zone.id,
            name: zone.name,
            status,
            name_servers: zone.name_servers,
        }
    }

    pub(crate) fn cf_record_to_dns_record(
        &self,
        cf_record: CloudflareDnsRecord,
        zone_id: &str,
        zone_name: &str,
    ) -> Result<DnsRecord> {
        let record_type: DnsRecordType =
            cf_record
                .record_type
                .parse()
                .map_err(|_| ProviderError::InvalidParameter {
                    provider: self.provider_name().to_string(),
                    param: "type".to_string(),
                    detail: format!("Unsupported record type: {}", cf_record.record_type),
                })?;

        Ok(DnsRecord {
            id: cf_record.id,
            zone_id: zone_id.to_string(),
            record_type,
            name: full_name_to_relative(&cf_record.name, zone_name),
            content: cf_record.content,
            ttl: Ttl::from_cloudflare(cf_record.ttl),
            proxied: cf_record.proxied,
            priority: cf_record.priority,
            created_at: parse_timestamp(cf_record.created_on.as_deref()),
            modified_at: parse_timestamp(cf_record.modified_on.as_deref()),
        })
    }

    /// Build the request body; SRV and CAA are sent through the structured `data` field.
    pub(crate) fn record_body(
        &self,
        input: &DnsRecordInput,
        zone_name: &str,
    ) -> Result<CloudflareRecordBody> {
        let name = relative_to_full_name(&input.name, zone_name);
        let mut body = CloudflareRecordBody {
            record_type: input.record_type.as_str(),
            name,
            content: Some(input.content.clone()),
            ttl: input.ttl.to_cloudflare(),
            priority: input.priority.filter(|_| input.record_type == DnsRecordType::Mx),
            proxied: input.proxied.filter(|_| input.record_type.supports_proxy()),
            data: None,
        };

        match input.record_type {
            DnsRecordType::Srv => {
                let data = self.srv_data(input)?;
                body.content = None;
                body.data = Some(
                    serde_json::to_value(data).map_err(|e| ProviderError::SerializationError {
                        provider: self.provider_name().to_string(),
                        detail: e.to_string(),
                    })?,
                );
            }
            DnsRecordType::Caa => {
                let data = self.caa_data(&input.content)?;
                body.content = None;
                body.data = Some(
                    serde_json::to_value(data).map_err(|e| ProviderError::SerializationError {
                        provider: self.provider_name().to_string(),
                        detail: e.to_string(),
                    })?,
                );
            }
            _ => {}
        }

        Ok(body)
    }

    /// SRV content is `"<weight> <port> <target>"`; priority travels separately.
    fn srv_data(&self, input: &DnsRecordInput) -> Result<CloudflareSrvData> {
        let invalid = |detail: &str| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: "content".to_string(),
            detail: detail.to_string(),
        };
        let parts: Vec<&str> = input.content.split_whitespace().collect();
        let [weight, port, target] = parts.as_slice() else {
            return Err(invalid("SRV content must be '<weight> <port> <target>'"));
        };
        Ok(CloudflareSrvData {
            priority: input.priority.unwrap_or(0),
            weight: weight.parse().map_err(|_| invalid("SRV weight must be 0-65535"))?,
            port: port.parse().map_err(|_| invalid("SRV port must be 0-65535"))?,
            target: target.trim_end_matches('.').to_string(),
        })
    }

    /// CAA content is `<flags> <tag> "<value>"`.
    fn caa_data(&self, content: &str) -> Result<CloudflareCaaData> {
        let invalid = |detail: &str| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: "content".to_string(),
            detail: detail.to_string(),
        };
        let mut parts = content.trim().splitn(3, char::is_whitespace);
        let (Some(flags), Some(tag), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("CAA content must be '<flags> <tag> \"<value>\"'"));
        };
        Ok(CloudflareCaaData {
            flags: flags.parse().map_err(|_| invalid("CAA flags must be 0-255"))?,
            tag: tag.to_string(),
            value: value.trim().trim_matches('"').to_string(),
        })
    }

    async fn zone_name(&self, zone_id: &str) -> Result<String> {
        Ok(self.get_zone(zone_id).await?.name)
    }
}

#[async_trait]
impl DnsProvider for CloudflareDnsClient {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        #[derive(Deserialize)]
        struct VerifyResponse {
            status: String,
        }

        match self
            .get::<VerifyResponse>("/user/tokens/verify", ErrorContext::default())
            .await
        {
            Ok(resp) => Ok(resp.status == "active"),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_zone(&self, domain: &str) -> Result<Option<Zone>> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        let mut path = format!("/zones?name={}", urlencoding::encode(&domain));
        if !self.account_id.is_empty() {
            path.push_str(&format!(
                "&account.id={}",
                urlencoding::encode(&self.account_id)
            ));
        }
        let context = ErrorContext {
            domain: Some(domain.clone()),
            ..ErrorContext::default()
        };
        let (zones, _) = self.get_page::<CloudflareZone>(&path, context).await?;
        Ok(zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(&domain))
            .map(Self::cf_zone_to_zone))
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        let context = ErrorContext {
            domain: Some(zone_id.to_string()),
            ..ErrorContext::default()
        };
        let zone: CloudflareZone = self.get(&format!("/zones/{zone_id}"), context).await?;
        Ok(Self::cf_zone_to_zone(zone))
    }

    async fn create_zone(&self, domain: &str) -> Result<Zone> {
        if self.account_id.is_empty() {
            return Err(ProviderError::MissingCredentials {
                provider: self.provider_name().to_string(),
                field: "account_id".to_string(),
            });
        }
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        let body = CreateZoneBody {
            name: domain.clone(),
            account: AccountRef {
                id: self.account_id.clone(),
            },
            zone_type: "full",
        };
        let context = ErrorContext {
            domain: Some(domain),
            ..ErrorContext::default()
        };
        let zone: CloudflareZone = self.post("/zones", &body, context).await?;
        log::info!("[cloudflare] Created zone {} ({})", zone.name, zone.id);
        Ok(Self::cf_zone_to_zone(zone))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let zone_name = self.zone_name(zone_id).await?;
        let mut records = Vec::new();
        let mut page = 1_u32;

        loop {
            let path = format!(
                "/zones/{zone_id}/dns_records?page={page}&per_page={MAX_PAGE_SIZE_RECORDS}"
            );
            let (cf_records, info) = self
                .get_page::<CloudflareDnsRecord>(&path, ErrorContext::default())
                .await?;
            let fetched = cf_records.len();

            for cf_record in cf_records {
                match self.cf_record_to_dns_record(cf_record, zone_id, &zone_name) {
                    Ok(record) => records.push(record),
                    // Types outside the managed set (LOC, HTTPS, ...) are skipped.
                    Err(e) => log::debug!("[cloudflare] Skipping record: {e}"),
                }
            }

            let last_page = match info.and_then(|i| i.total_pages.map(|t| (i.page, t))) {
                Some((current, total)) => current >= total,
                None => fetched < MAX_PAGE_SIZE_RECORDS as usize,
            };
            if last_page || fetched == 0 {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, input: &DnsRecordInput) -> Result<DnsRecord> {
        let zone_name = self.zone_name(zone_id).await?;
        let body = self.record_body(input, &zone_name)?;
        let context = ErrorContext {
            record_name: Some(input.name.clone()),
            ..ErrorContext::default()
        };
        let cf_record: CloudflareDnsRecord = self
            .post(&format!("/zones/{zone_id}/dns_records"), &body, context)
            .await?;
        self.cf_record_to_dns_record(cf_record, zone_id, &zone_name)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        input: &DnsRecordInput,
    ) -> Result<DnsRecord> {
        let zone_name = self.zone_name(zone_id).await?;
        let body = self.record_body(input, &zone_name)?;
        let context = ErrorContext {
            record_name: Some(input.name.clone()),
            record_id: Some(record_id.to_string()),
            ..ErrorContext::default()
        };
        let cf_record: CloudflareDnsRecord = self
            .patch(
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                &body,
                context,
            )
            .await?;
        self.cf_record_to_dns_record(cf_record, zone_id, &zone_name)
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let context = ErrorContext {
            record_id: Some(record_id.to_string()),
            ..ErrorContext::default()
        };
        self.delete(&format!("/zones/{zone_id}/dns_records/{record_id}"), context)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::DnsCredentials;

    fn client() -> CloudflareDnsClient {
        CloudflareDnsClient::new(&DnsCredentials {
            account_id: "acct".to_string(),
            api_token: "token".to_string(),
        })
    }

    #[test]
    fn body_drops_proxy_and_priority_where_meaningless() {
        let input = DnsRecordInput::new(DnsRecordType::Txt, "@", "v=spf1 -all")
            .with_proxied(true)
            .with_priority(10);
        let body = client().record_body(&input, "example.com").unwrap();
        assert_eq!(body.name, "example.com");
        assert_eq!(body.proxied, None);
        assert_eq!(body.priority, None);
        assert_eq!(body.ttl, 1);
    }

    #[test]
    fn srv_body_uses_data() {
        let input = DnsRecordInput::new(DnsRecordType::Srv, "_sip._tcp", "5 5060 sip.example.com.")
            .with_priority(10);
        let body = client().record_body(&input, "example.com").unwrap();
        assert!(body.content.is_none());
        let data = body.data.unwrap();
        assert_eq!(data["priority"], 10);
        assert_eq!(data["port"], 5060);
        assert_eq!(data["target"], "sip.example.com");
    }

    #[test]
    fn caa_body_uses_data() {
        let input = DnsRecordInput::new(DnsRecordType::Caa, "@", "0 issue \"letsencrypt.org\"");
        let body = client().record_body(&input, "example.com").unwrap();
        let data = body.data.unwrap();
        assert_eq!(data["flags"], 0);
        assert_eq!(data["tag"], "issue");
        assert_eq!(data["value"], "letsencrypt.org");
    }

    #[test]
    fn zone_status_mapping() {
        let zone = CloudflareDnsClient::cf_zone_to_zone(CloudflareZone {
            id: "z".into(),
            name: "example.com".into(),
            status: "initializing".into(),
            name_servers: vec!["ada.ns.cloudflare.com".into()],
        });
        assert_eq!(zone.status, ZoneStatus::Pending);
        assert_eq!(zone.name_servers.len(), 1);
    }
}
