//! Toolbox data types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ToolboxError;

/// Per-resolver timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// DNS record types that can be checked over DoH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsQueryType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Text record.
    Txt,
    /// Name server record.
    Ns,
    /// Service locator record.
    Srv,
    /// Certificate Authority Authorization record.
    Caa,
}

impl DnsQueryType {
    /// Wire type code as it appears in the DoH JSON `type` field.
    pub fn code(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Caa => 257,
        }
    }

    /// Bring an answer (or an expected value) into comparable form.
    ///
    /// TXT loses its surrounding quotes; name-valued types lose the trailing dot.
    pub fn normalize_answer(self, data: &str) -> String {
        let data = data.trim();
        match self {
            Self::Txt => data
                .strip_prefix('"')
                .and_then(|d| d.strip_suffix('"'))
                .unwrap_or(data)
                .to_string(),
            Self::Cname | Self::Ns | Self::Mx => data.trim_end_matches('.').to_string(),
            _ => data.to_string(),
        }
    }
}

impl fmt::Display for DnsQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Aaaa => write!(f, "AAAA"),
            Self::Cname => write!(f, "CNAME"),
            Self::Mx => write!(f, "MX"),
            Self::Txt => write!(f, "TXT"),
            Self::Ns => write!(f, "NS"),
            Self::Srv => write!(f, "SRV"),
            Self::Caa => write!(f, "CAA"),
        }
    }
}

impl FromStr for DnsQueryType {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "CNAME" => Ok(Self::Cname),
            "MX" => Ok(Self::Mx),
            "TXT" => Ok(Self::Txt),
            "NS" => Ok(Self::Ns),
            "SRV" => Ok(Self::Srv),
            "CAA" => Ok(Self::Caa),
            _ => Err(ToolboxError::ValidationError(format!(
                "Unsupported DNS query type: {s}"
            ))),
        }
    }
}

/// A DNS-over-HTTPS endpoint speaking the JSON API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DohResolver {
    pub name: String,
    pub url: String,
}

impl DohResolver {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Cloudflare, Google and Quad9.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Cloudflare", "https://cloudflare-dns.com/dns-query"),
            Self::new("Google", "https://dns.google/resolve"),
            Self::new("Quad9", "https://dns.quad9.net:5053/dns-query"),
        ]
    }
}

/// One resolver's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationCheckResult {
    /// Resolver name.
    pub server: String,
    /// The resolver answered with NOERROR.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<String>,
    pub matches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
}

/// Aggregate over every configured resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationVerdict {
    pub hostname: String,
    pub record_type: DnsQueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// True iff every resolver succeeded and matched.
    pub propagated: bool,
    pub per_server: Vec<PropagationCheckResult>,
    pub total_time_ms: u64,
}

impl PropagationVerdict {
    /// Number of resolvers that already see the expected answer.
    pub fn matching_count(&self) -> usize {
        self.per_server.iter().filter(|r| r.success && r.matches).count()
    }
}
