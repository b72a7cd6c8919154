//! Cloudflare API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::RawApiError;

/// The `{success, result, errors}` envelope every Cloudflare v4 endpoint returns.
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareResultInfo {
    pub page: u32,
    #[allow(dead_code)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[allow(dead_code)]
    pub total_count: u32,
}

/// First error of a failed envelope; a bare message when `errors` is empty.
pub fn envelope_error(errors: &[CloudflareError]) -> RawApiError {
    errors.first().map_or_else(
        || RawApiError::new("Unknown error"),
        |e| RawApiError::with_code(e.code.to_string(), e.message.clone()),
    )
}

#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// DNS record as returned by the API.
#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub ttl: u32,
    pub priority: Option<u16>,
    pub proxied: Option<bool>,
    pub created_on: Option<String>,
    pub modified_on: Option<String>,
}

/// Body for create (POST) and overwrite (PATCH) calls.
#[derive(Debug, Serialize)]
pub struct CloudflareRecordBody {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// Structured payload for SRV and CAA records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CloudflareSrvData {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct CloudflareCaaData {
    pub flags: u8,
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CreateZoneBody {
    pub name: String,
    pub account: AccountRef,
    #[serde(rename = "type")]
    pub zone_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AccountRef {
    pub id: String,
}
