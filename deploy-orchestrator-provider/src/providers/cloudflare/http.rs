//! Cloudflare HTTP request methods

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper};

use super::types::CloudflareResultInfo;
use super::{CloudflareDnsClient, CloudflareResponse, IDEMPOTENT_RETRIES, envelope_error};

impl CloudflareDnsClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_token)
    }

    /// Send, unwrap the envelope, and map `success: false` through the error mapper.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method_name: &str,
        path: &str,
        max_retries: u32,
        context: ErrorContext,
    ) -> Result<(Option<T>, Option<CloudflareResultInfo>)> {
        let (status, text) = HttpUtils::execute_request_with_retry(
            self.authorized(builder),
            self.provider_name(),
            method_name,
            path,
            max_retries,
        )
        .await?;

        let envelope: CloudflareResponse<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Non-JSON error pages (gateway, auth) still deserve a typed error.
                HttpUtils::ensure_success(self.provider_name(), method_name, status, &text)?;
                return Err(self.parse_error(e));
            }
        };

        if !envelope.success {
            let raw = envelope_error(&envelope.errors);
            log::warn!("[cloudflare] API error on {method_name} {path}: {}", raw.message);
            return Err(self.map_error(raw, context));
        }

        Ok((envelope.result, envelope.result_info))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<T> {
        let builder = self.client.get(self.url(path));
        let (result, _) = self
            .send(builder, "GET", path, IDEMPOTENT_RETRIES, context)
            .await?;
        result.ok_or_else(|| self.parse_error("response is missing the result field"))
    }

    /// GET a list endpoint, returning the page plus the `result_info` block.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<(Vec<T>, Option<CloudflareResultInfo>)> {
        let builder = self.client.get(self.url(path));
        let (result, info) = self
            .send(builder, "GET", path, IDEMPOTENT_RETRIES, context)
            .await?;
        Ok((result.unwrap_or_default(), info))
    }

    /// POST is not retried: a lost response could otherwise create duplicates.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        context: ErrorContext,
    ) -> Result<T> {
        let builder = self.client.post(self.url(path)).json(body);
        let (result, _) = self.send(builder, "POST", path, 0, context).await?;
        result.ok_or_else(|| self.parse_error("response is missing the result field"))
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        context: ErrorContext,
    ) -> Result<T> {
        let builder = self.client.patch(self.url(path)).json(body);
        let (result, _) = self
            .send(builder, "PATCH", path, IDEMPOTENT_RETRIES, context)
            .await?;
        result.ok_or_else(|| self.parse_error("response is missing the result field"))
    }

    pub(crate) async fn delete(&self, path: &str, context: ErrorContext) -> Result<()> {
        let builder = self.client.delete(self.url(path));
        self.send::<serde_json::Value>(builder, "DELETE", path, IDEMPOTENT_RETRIES, context)
            .await?;
        Ok(())
    }
}
