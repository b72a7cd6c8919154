//! Pieces shared by the adapters: naming, URL handling, Cloudflare envelopes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::{HttpUtils, extract_error_message};
use crate::providers::cloudflare::{CloudflareResponse, envelope_error};
use crate::types::{Artifact, SiteContext};

/// `lp-<slug>` clipped to `max_len`, never ending in `-`.
pub(crate) fn resource_name(explicit: Option<&str>, site: &SiteContext, max_len: usize) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let name: String = format!("lp-{}", site.slug()).chars().take(max_len).collect();
    name.trim_end_matches('-').to_string()
}

/// Host part of an absolute URL, without port.
pub(crate) fn url_host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if host.starts_with('[') {
        host.split_once(']').map(|(h, _)| h.trim_start_matches('['))?
    } else {
        host.split(':').next()?
    };
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// Artifact file as sent to the deploy proxy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EncodedFile {
    pub path: String,
    pub content: String,
    pub encoding: &'static str,
}

/// Base64-encode every artifact file for JSON transport.
pub(crate) fn encode_files(artifact: &Artifact) -> Vec<EncodedFile> {
    artifact
        .iter()
        .map(|(path, content)| EncodedFile {
            path: path.to_string(),
            content: BASE64.encode(content),
            encoding: "base64",
        })
        .collect()
}

/// Unwrap a Cloudflare envelope from a hosting endpoint (Pages, Workers).
///
/// Authentication codes become [`ProviderError::InvalidCredentials`]; every other
/// `success: false` becomes [`ProviderError::PublishRejected`] for `step`.
pub(crate) fn cloudflare_result<T: DeserializeOwned>(
    provider: &str,
    step: &str,
    status: u16,
    text: &str,
) -> Result<Option<T>> {
    let envelope: CloudflareResponse<T> = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            HttpUtils::ensure_success(provider, step, status, text)?;
            return Err(ProviderError::ParseError {
                provider: provider.to_string(),
                detail: e.to_string(),
            });
        }
    };

    if envelope.success {
        return Ok(envelope.result);
    }

    let raw = envelope_error(&envelope.errors);
    log::warn!("[{provider}] {step} rejected: {}", raw.message);
    Err(match raw.code.as_deref() {
        Some("10000" | "9109" | "1000") => ProviderError::InvalidCredentials {
            provider: provider.to_string(),
            raw_message: Some(raw.message),
        },
        _ if status == 403 => ProviderError::PermissionDenied {
            provider: provider.to_string(),
            raw_message: Some(raw.message),
        },
        _ => ProviderError::PublishRejected {
            provider: provider.to_string(),
            step: step.to_string(),
            status,
            raw_message: raw.message,
        },
    })
}

/// Like [`cloudflare_result`] but a missing `result` is an error.
pub(crate) fn require_cloudflare_result<T: DeserializeOwned>(
    provider: &str,
    step: &str,
    status: u16,
    text: &str,
) -> Result<T> {
    cloudflare_result(provider, step, status, text)?.ok_or_else(|| ProviderError::ParseError {
        provider: provider.to_string(),
        detail: format!("{step}: response is missing the result field"),
    })
}

/// Response shape of the deploy proxy used by the VPS and git-push targets.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProxyDeployResponse {
    #[serde(default)]
    pub success: bool,
    pub url: Option<String>,
    pub commit_url: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Check HTTP status and the proxy's own `success` flag.
pub(crate) fn proxy_result(
    provider: &str,
    step: &str,
    status: u16,
    text: &str,
) -> Result<ProxyDeployResponse> {
    HttpUtils::ensure_success(provider, step, status, text)?;
    let response: ProxyDeployResponse = HttpUtils::parse_json(text, provider)?;
    if !response.success {
        let message = response
            .error
            .clone()
            .or_else(|| response.message.clone())
            .unwrap_or_else(|| extract_error_message(text));
        return Err(ProviderError::PublishRejected {
            provider: provider.to_string(),
            step: step.to_string(),
            status,
            raw_message: message,
        });
    }
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_prefers_explicit() {
        let site = SiteContext::new("s1").with_domain("example.com");
        assert_eq!(resource_name(Some("mine"), &site, 58), "mine");
        assert_eq!(resource_name(Some("  "), &site, 58), "lp-example-com");
        assert_eq!(resource_name(None, &site, 7), "lp-exam");
        assert_eq!(resource_name(None, &site, 3), "lp");
    }

    #[test]
    fn hosts_from_urls() {
        assert_eq!(url_host("https://Site.netlify.app/").as_deref(), Some("site.netlify.app"));
        assert_eq!(url_host("http://203.0.113.7:8080/x").as_deref(), Some("203.0.113.7"));
        assert_eq!(url_host("https://[2001:db8::1]/").as_deref(), Some("2001:db8::1"));
        assert_eq!(url_host("d111.cloudfront.net").as_deref(), Some("d111.cloudfront.net"));
        assert_eq!(url_host("https://"), None);
    }

    #[test]
    fn envelope_auth_error() {
        let body = r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}],"result":null}"#;
        let err = cloudflare_result::<serde_json::Value>("cf-pages", "Upload", 400, body).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCredentials { .. }));
    }

    #[test]
    fn envelope_other_error_is_rejection() {
        let body = r#"{"success":false,"errors":[{"code":8000000,"message":"bad"}]}"#;
        let err = cloudflare_result::<serde_json::Value>("cf-pages", "Upload", 400, body).unwrap_err();
        assert!(matches!(err, ProviderError::PublishRejected { status: 400, .. }));
    }

    #[test]
    fn proxy_failure_uses_error_field() {
        let err = proxy_result("vps-ssh", "VPS transfer", 200, r#"{"success":false,"error":"scp failed"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("scp failed"));
    }

    #[test]
    fn encoded_files_are_base64() {
        let files = encode_files(&Artifact::single_page("hi"));
        assert_eq!(files[0].path, "index.html");
        assert_eq!(files[0].content, "aGk=");
    }
}
