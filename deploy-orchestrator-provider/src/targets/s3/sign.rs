//! AWS Signature Version 4
//!
//! Reference: <https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html>

use std::fmt::Write;

use crate::providers::common::{hmac_sha256, sha256_hex};
use crate::utils::log_sanitizer::truncate_for_log;

pub(crate) const UNSIGNED_EMPTY_PAYLOAD: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Signs requests for one service in one region.
pub(crate) struct SigV4Signer<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Pieces of a request that go into the signature.
pub(crate) struct SignableRequest<'a> {
    pub method: &'a str,
    /// Already percent-encoded path.
    pub path: &'a str,
    /// Raw query string without `?`.
    pub query: &'a str,
    /// Headers to sign; `host` and `x-amz-date` must be among them.
    pub headers: &'a [(String, String)],
    pub payload_hash: &'a str,
}

impl SigV4Signer<'_> {
    /// Build the `Authorization` header value. `amz_date` is `YYYYMMDDTHHMMSSZ`.
    pub(crate) fn authorization(&self, request: &SignableRequest<'_>, amz_date: &str) -> String {
        let date = &amz_date[..amz_date.len().min(8)];

        // 1. Canonical query: parameters sorted by name
        let canonical_query = if request.query.is_empty() {
            String::new()
        } else {
            let mut params: Vec<&str> = request.query.split('&').collect();
            params.sort_unstable();
            params.join("&")
        };

        // 2. Canonical headers: lowercase names, trimmed values, sorted
        let mut headers: Vec<(String, &str)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.trim()))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_headers = headers.iter().fold(String::new(), |mut acc, (k, v)| {
            let _ = writeln!(acc, "{k}:{v}");
            acc
        });
        let signed_headers = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let path = if request.path.is_empty() { "/" } else { request.path };
        let canonical_request = format!(
            "{}\n{path}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{}",
            request.method, request.payload_hash
        );
        log::debug!("CanonicalRequest:\n{}", truncate_for_log(&canonical_request));

        // 3. String to sign
        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        // 4. Derived signing key
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            date.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        )
    }
}
