use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProviderError;

/// DNS record types the orchestrator manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
}

impl DnsRecordType {
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Mx,
        Self::Txt,
        Self::Ns,
        Self::Srv,
        Self::Caa,
    ];

    /// Wire name, e.g. `"AAAA"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
        }
    }

    /// Only address and alias records can sit behind the Cloudflare proxy.
    pub fn supports_proxy(self) -> bool {
        matches!(self, Self::A | Self::Aaaa | Self::Cname)
    }

    /// Record types whose wire format carries a priority.
    pub fn uses_priority(self) -> bool {
        matches!(self, Self::Mx | Self::Srv)
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsRecordType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProviderError::InvalidParameter {
                provider: "dns".to_string(),
                param: "record_type".to_string(),
                detail: format!("Unsupported record type: {s}"),
            })
    }
}

/// Record TTL. Serialized as `"auto"` or a number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    #[default]
    Auto,
    Seconds(u32),
}

impl Ttl {
    pub const MIN_SECONDS: u32 = 60;
    pub const MAX_SECONDS: u32 = 86_400;

    /// Cloudflare encodes "automatic" as `1`.
    pub fn to_cloudflare(self) -> u32 {
        match self {
            Self::Auto => 1,
            Self::Seconds(s) => s,
        }
    }

    pub fn from_cloudflare(ttl: u32) -> Self {
        if ttl == 1 { Self::Auto } else { Self::Seconds(ttl) }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Seconds(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for Ttl {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<u32>()
            .map(Self::from_cloudflare)
            .map_err(|_| ProviderError::InvalidParameter {
                provider: "dns".to_string(),
                param: "ttl".to_string(),
                detail: format!("expected 'auto' or seconds, got '{s}'"),
            })
    }
}

impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Seconds(s) => serializer.serialize_u32(*s),
        }
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Seconds(s) => Ok(Self::from_cloudflare(s)),
            Raw::Text(t) => t.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A DNS record as mirrored from the provider. `name` is relative to the zone (`@` = apex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub id: String,
    pub zone_id: String,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: Ttl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Write shape of a record: everything the caller controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordInput {
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub ttl: Ttl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

impl DnsRecordInput {
    pub fn new(
        record_type: DnsRecordType,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            ttl: Ttl::Auto,
            proxied: None,
            priority: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = Some(proxied);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether an existing record already carries exactly this input.
    ///
    /// Names compare case-insensitively; an absent `proxied` equals `false`.
    pub fn matches_record(&self, record: &DnsRecord) -> bool {
        self.record_type == record.record_type
            && self.name.eq_ignore_ascii_case(&record.name)
            && self.content == record.content
            && self.ttl == record.ttl
            && self.proxied.unwrap_or(false) == record.proxied.unwrap_or(false)
            && (!self.record_type.uses_priority() || self.priority == record.priority)
    }
}

/// Credentials for the DNS-hosting account (Cloudflare).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsCredentials {
    pub account_id: String,
    pub api_token: String,
}

/// Zone lifecycle as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Active,
    Pending,
    Moved,
    Unknown,
}

/// The provider's representation of a domain and its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub status: ZoneStatus,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// Outcome of creating several records where each may fail independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResult {
    pub created_records: Vec<DnsRecord>,
    pub failures: Vec<BatchCreateFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateFailure {
    /// Index into the submitted inputs.
    pub request_index: usize,
    pub record_name: String,
    #[serde(rename = "type")]
    pub record_type: DnsRecordType,
    pub reason: String,
}
