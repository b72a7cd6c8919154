//! Cloudflare DNS client

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::providers::common::{create_http_client, trim_base_url};
use crate::types::DnsCredentials;

pub(crate) use types::{
    CloudflareDnsRecord, CloudflareResponse, CloudflareZone, envelope_error,
};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Page size for the DNS records listing (API maximum).
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;
/// Retries for idempotent calls (GET, PATCH, DELETE).
pub(crate) const IDEMPOTENT_RETRIES: u32 = 2;

/// Cloudflare DNS client scoped to one account.
pub struct CloudflareDnsClient {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) account_id: String,
    pub(crate) base_url: String,
}

impl CloudflareDnsClient {
    pub fn new(credentials: &DnsCredentials) -> Self {
        Self {
            client: create_http_client(),
            api_token: credentials.api_token.clone(),
            account_id: credentials.account_id.clone(),
            base_url: CF_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root (mock servers, API gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}
