//! Shared HTTP plumbing for the DNS client and the target adapters.
//!
//! Every remote service signs and shapes its requests differently, so callers build
//! their own `RequestBuilder`. What is shared is the send/log/read cycle, mapping of
//! transport-level failures, status checks for hosting APIs, and the retry loop.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Stateless helpers around `reqwest`.
pub struct HttpUtils;

impl HttpUtils {
    /// Send a request and return `(status, body)`.
    ///
    /// 429 becomes [`ProviderError::RateLimited`] (honouring `Retry-After`), 502/503/504
    /// become [`ProviderError::NetworkError`]. Any other status is returned to the
    /// caller, which knows whether it wants an envelope or a plain status check.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url_or_action}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status_code}");

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(body),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Upstream unavailable (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Deserialize a response body, logging the (clipped) raw text on failure.
    pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{provider_name}] JSON parse failed: {e}");
            log::error!(
                "[{provider_name}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Turn a non-2xx status from a hosting API into a typed error.
    ///
    /// 401 maps to [`ProviderError::InvalidCredentials`], 403 to
    /// [`ProviderError::PermissionDenied`], everything else to
    /// [`ProviderError::PublishRejected`] tagged with the publish `step`.
    pub fn ensure_success(
        provider_name: &str,
        step: &str,
        status: u16,
        body: &str,
    ) -> Result<(), ProviderError> {
        if (200..300).contains(&status) {
            return Ok(());
        }
        let message = extract_error_message(body);
        log::warn!("[{provider_name}] {step} failed: HTTP {status} {message}");
        Err(match status {
            401 => ProviderError::InvalidCredentials {
                provider: provider_name.to_string(),
                raw_message: Some(message),
            },
            403 => ProviderError::PermissionDenied {
                provider: provider_name.to_string(),
                raw_message: Some(message),
            },
            _ => ProviderError::PublishRejected {
                provider: provider_name.to_string(),
                step: step.to_string(),
                status,
                raw_message: message,
            },
        })
    }

    /// Like [`execute_request`](Self::execute_request), retrying transient failures.
    ///
    /// Only network errors, timeouts and rate limits are retried. Backoff doubles from
    /// 100ms up to 10s; a `Retry-After` hint (capped at 30s) takes precedence. Requests
    /// with streaming bodies cannot be cloned and are sent once.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        if max_retries == 0 {
            return Self::execute_request(
                request_builder,
                provider_name,
                method_name,
                url_or_action,
            )
            .await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{provider_name}] Request body is not clonable, sending once");
                return Self::execute_request(
                    request_builder,
                    provider_name,
                    method_name,
                    url_or_action,
                )
                .await;
            };

            match Self::execute_request(req, provider_name, method_name, url_or_action).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "[{}] Attempt {}/{} failed, retrying in {:.1}s: {}",
                        provider_name,
                        attempt + 1,
                        max_retries,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NetworkError {
            provider: provider_name.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}

/// Best-effort human message from an error body.
///
/// Understands `{"message"}`, `{"error": "..."}`, `{"error": {"message"}}` and the
/// Cloudflare `{"errors": [{"message"}]}` shapes; falls back to the clipped raw text.
pub fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return truncate_for_log(body.trim());
    };
    let candidates = [
        value.get("message"),
        value.get("error").filter(|v| v.is_string()),
        value.get("error").and_then(|v| v.get("message")),
        value
            .get("errors")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map_or_else(|| truncate_for_log(body.trim()), str::to_string)
}

/// Transient failures worth another attempt.
fn is_retryable(error: &ProviderError) -> bool {
    matches!(
        error,
        ProviderError::NetworkError { .. }
            | ProviderError::Timeout { .. }
            | ProviderError::RateLimited { .. }
    )
}

fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << shift).min(10_000);
    Duration::from_millis(delay_ms)
}
