//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareDnsClient;

/// Reference: <https://developers.cloudflare.com/fundamentals/api/reference/errors/>
impl ProviderErrorMapper for CloudflareDnsClient {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            // 1000: Invalid API token
            // 6003/6103/6111: malformed auth headers
            // 9109: Unauthorized to access requested resource
            // 10000: Authentication error
            Some("1000" | "6003" | "6103" | "6111" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }

            // 9300/9301: token lacks the required permission
            Some("9300" | "9301") => ProviderError::PermissionDenied {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            // 1004: DNS Validation Error
            // 9000: Invalid or missing name
            // 9005/9006: bad A/AAAA content
            // 9009: MX content must be a hostname
            // 9021: Invalid TTL
            // 9041: This DNS record cannot be proxied
            // 1049: not a registered domain
            Some(code @ ("1004" | "9000" | "9005" | "9006" | "9009" | "9021" | "9041" | "1049")) => {
                let param = match code {
                    "9000" => "name",
                    "9005" | "9006" | "9009" => "content",
                    "9021" => "ttl",
                    "9041" => "proxied",
                    "1049" => "domain",
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider: self.provider_name().to_string(),
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053-81058: a conflicting record already exists
            Some("81053" | "81054" | "81055" | "81056" | "81057" | "81058") => {
                ProviderError::RecordExists {
                    provider: self.provider_name().to_string(),
                    record_name: context
                        .record_name
                        .unwrap_or_else(|| "<unknown>".to_string()),
                    raw_message: Some(raw.message),
                }
            }

            // 81044: Record does not exist
            Some("81044") => ProviderError::RecordNotFound {
                provider: self.provider_name().to_string(),
                record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // 81045: record quota exceeded; 1105: zone quota exceeded
            Some("81045" | "1105") => ProviderError::QuotaExceeded {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            // 7000/7003: no route / invalid object identifier
            // 1001: Invalid zone identifier
            Some("7000" | "7003" | "1001") => ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DnsCredentials;

    fn client() -> CloudflareDnsClient {
        CloudflareDnsClient::new(&DnsCredentials {
            account_id: String::new(),
            api_token: String::new(),
        })
    }

    #[test]
    fn auth_codes_map_to_invalid_credentials() {
        for code in ["1000", "6003", "9109", "10000"] {
            let err = client().map_error(RawApiError::with_code(code, "nope"), ErrorContext::default());
            assert!(
                matches!(err, ProviderError::InvalidCredentials { .. }),
                "code {code} mapped to {err:?}"
            );
        }
    }

    #[test]
    fn validation_codes_name_the_parameter() {
        let err = client().map_error(
            RawApiError::with_code("9005", "Content for A record is invalid"),
            ErrorContext::default(),
        );
        assert!(matches!(
            err,
            ProviderError::InvalidParameter { ref param, .. } if param == "content"
        ));
    }

    #[test]
    fn record_exists_uses_context_name() {
        let ctx = ErrorContext {
            record_name: Some("www".to_string()),
            ..ErrorContext::default()
        };
        let err = client().map_error(RawApiError::with_code("81057", "exists"), ctx);
        assert!(matches!(
            err,
            ProviderError::RecordExists { ref record_name, .. } if record_name == "www"
        ));
    }

    #[test]
    fn record_not_found_without_context() {
        let err = client().map_error(RawApiError::with_code("81044", "gone"), ErrorContext::default());
        assert!(matches!(
            err,
            ProviderError::RecordNotFound { ref record_id, .. } if record_id == "<unknown>"
        ));
    }

    #[test]
    fn zone_codes_map_to_zone_not_found() {
        let ctx = ErrorContext {
            domain: Some("example.com".to_string()),
            ..ErrorContext::default()
        };
        let err = client().map_error(RawApiError::with_code("7003", "bad id"), ctx);
        assert!(matches!(err, ProviderError::ZoneNotFound { .. }));
    }

    #[test]
    fn unmapped_codes_fall_back_to_unknown() {
        let err = client().map_error(RawApiError::with_code("99999", "odd"), ErrorContext::default());
        assert!(matches!(
            err,
            ProviderError::Unknown { raw_code: Some(ref c), .. } if c == "99999"
        ));
    }
}
