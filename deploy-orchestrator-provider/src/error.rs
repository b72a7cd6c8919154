use serde::{Deserialize, Serialize};

/// Unified error type for every outbound call made by this crate.
///
/// Each variant carries a `provider` field naming the remote service that produced it
/// (`cloudflare`, `cf-pages`, `netlify`, `s3`, ...), plus variant-specific context.
/// All variants are serializable so front ends can render them structurally.
///
/// # Retryable Errors
///
/// - [`NetworkError`](Self::NetworkError): connectivity issues and 502/503/504 responses
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
///
/// Idempotent calls retry these with exponential backoff; uploads do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The provided credentials were rejected by the remote API.
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A required credential field is empty or malformed. Raised before any network I/O.
    MissingCredentials {
        /// Provider the credentials belong to.
        provider: String,
        /// Name of the missing or malformed field.
        field: String,
    },

    /// A DNS record with the same name/type already exists.
    RecordExists {
        /// Provider that produced the error.
        provider: String,
        /// Name of the conflicting record.
        record_name: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The specified DNS record was not found.
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// ID of the record that was not found.
        record_id: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A request parameter is invalid (bad TTL, malformed address, ...).
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The account's resource quota has been exceeded.
    QuotaExceeded {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The API rate limit has been exceeded (HTTP 429 or equivalent).
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The zone for a domain does not exist on the DNS account.
    ZoneNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Domain name that was looked up.
        domain: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The authenticated principal lacks permission for the requested operation.
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A hosting API answered a publish step with a non-2xx status.
    PublishRejected {
        /// Provider that produced the error.
        provider: String,
        /// Publish step that failed (`create project`, `upload`, ...).
        step: String,
        /// HTTP status code.
        status: u16,
        /// Response body or extracted message.
        raw_message: String,
    },

    /// Failed to parse the provider's API response.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// An unrecognized error from the provider API.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// Whether the error stems from user input or account state rather than a fault.
    ///
    /// Callers log expected errors at `warn` and everything else at `error`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::MissingCredentials { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::QuotaExceeded { .. }
                | Self::ZoneNotFound { .. }
                | Self::PermissionDenied { .. }
        )
    }

    /// Whether the error is a configuration problem detected before any network I/O.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials { .. })
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::MissingCredentials { provider, field } => {
                write!(f, "[{provider}] Missing or invalid credential '{field}'")
            }
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_name}' already exists")
            }
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_id}' not found")
            }
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => {
                write!(f, "[{provider}] Invalid parameter '{param}': {detail}")
            }
            Self::QuotaExceeded { provider, .. } => {
                write!(f, "[{provider}] Quota exceeded")
            }
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{provider}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{provider}] Rate limited")
                }
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::ZoneNotFound {
                provider,
                domain,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Zone for '{domain}' not found: {msg}")
                } else {
                    write!(f, "[{provider}] Zone for '{domain}' not found")
                }
            }
            Self::PermissionDenied {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Permission denied: {msg}")
                } else {
                    write!(f, "[{provider}] Permission denied")
                }
            }
            Self::PublishRejected {
                provider,
                step,
                status,
                raw_message,
            } => {
                write!(f, "[{provider}] {step} failed (HTTP {status}): {raw_message}")
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_network_error() {
        let e = ProviderError::NetworkError {
            provider: "netlify".to_string(),
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "[netlify] Network error: connection refused");
    }

    #[test]
    fn display_invalid_credentials_with_message() {
        let e = ProviderError::InvalidCredentials {
            provider: "cloudflare".to_string(),
            raw_message: Some("bad token".to_string()),
        };
        assert_eq!(e.to_string(), "[cloudflare] Invalid credentials: bad token");
    }

    #[test]
    fn display_missing_credentials() {
        let e = ProviderError::MissingCredentials {
            provider: "s3".to_string(),
            field: "bucket".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[s3] Missing or invalid credential 'bucket'"
        );
        assert!(e.is_configuration());
        assert!(e.is_expected());
    }

    #[test]
    fn display_publish_rejected() {
        let e = ProviderError::PublishRejected {
            provider: "cf-pages".to_string(),
            step: "Create deployment".to_string(),
            status: 500,
            raw_message: "boom".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[cf-pages] Create deployment failed (HTTP 500): boom"
        );
        assert!(!e.is_expected());
    }

    #[test]
    fn display_rate_limited_with_retry() {
        let e = ProviderError::RateLimited {
            provider: "cloudflare".to_string(),
            retry_after: Some(30),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudflare] Rate limited (retry after 30s)");
    }

    #[test]
    fn display_zone_not_found() {
        let e = ProviderError::ZoneNotFound {
            provider: "cloudflare".to_string(),
            domain: "example.com".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "[cloudflare] Zone for 'example.com' not found");
    }

    #[test]
    fn serializes_with_code_tag() {
        let e = ProviderError::Timeout {
            provider: "s3".to_string(),
            detail: "30s elapsed".to_string(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["code"], "Timeout");
        assert_eq!(json["provider"], "s3");
    }
}
