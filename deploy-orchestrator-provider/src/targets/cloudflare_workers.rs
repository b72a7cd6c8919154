//! Cloudflare Workers: the artifact is embedded in a single ES-module script.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::providers::common::{content_type_for, create_http_client, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{
    Artifact, CloudflareWorkersCredentials, DeploymentTarget, DnsTarget, PublishOutcome,
    SiteContext,
};

use super::support::{cloudflare_result, require_cloudflare_result, resource_name};

const PROVIDER: &str = "cf-workers";
const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const WORKER_NAME_MAX: usize = 63;
const COMPATIBILITY_DATE: &str = "2024-09-23";

const WORKER_RUNTIME: &str = r#"
function decode(b64) {
  const bin = atob(b64);
  const bytes = new Uint8Array(bin.length);
  for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
  return bytes;
}

export default {
  async fetch(request) {
    let path = new URL(request.url).pathname;
    if (path.endsWith("/")) path += "index.html";
    const asset = ASSETS[path] || ASSETS[path + ".html"] || ASSETS["/index.html"];
    if (!asset) return new Response("Not found", { status: 404 });
    return new Response(decode(asset.body), { headers: { "content-type": asset.type } });
  },
};
"#;

#[derive(Debug, Serialize)]
struct EmbeddedAsset {
    body: String,
    #[serde(rename = "type")]
    content_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct WorkersSubdomain {
    subdomain: String,
}

#[derive(Debug, Deserialize)]
struct UploadedScript {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    etag: Option<String>,
}

/// Render the module source serving every artifact file.
pub(crate) fn build_worker_script(artifact: &Artifact) -> Result<String> {
    let assets: BTreeMap<String, EmbeddedAsset> = artifact
        .iter()
        .map(|(path, content)| {
            (
                format!("/{path}"),
                EmbeddedAsset {
                    body: BASE64.encode(content),
                    content_type: content_type_for(path),
                },
            )
        })
        .collect();
    let assets = serde_json::to_string(&assets).map_err(|e| ProviderError::SerializationError {
        provider: PROVIDER.to_string(),
        detail: e.to_string(),
    })?;
    Ok(format!("const ASSETS = {assets};\n{WORKER_RUNTIME}"))
}

/// Publishes the artifact as a Worker on the account's `workers.dev` subdomain.
pub struct CloudflareWorkersAdapter {
    client: Client,
    credentials: CloudflareWorkersCredentials,
    base_url: String,
}

impl CloudflareWorkersAdapter {
    pub fn new(credentials: CloudflareWorkersCredentials) -> Self {
        Self {
            client: create_http_client(),
            credentials,
            base_url: CF_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    fn account_url(&self) -> String {
        format!("{}/accounts/{}/workers", self.base_url, self.credentials.account_id)
    }

    async fn upload_script(&self, name: &str, script: String) -> Result<UploadedScript> {
        let serialization = |e: reqwest::Error| ProviderError::SerializationError {
            provider: PROVIDER.to_string(),
            detail: e.to_string(),
        };
        let metadata = serde_json::json!({
            "main_module": "worker.js",
            "compatibility_date": COMPATIBILITY_DATE,
        })
        .to_string();
        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata)
                    .mime_str("application/json")
                    .map_err(serialization)?,
            )
            .part(
                "worker.js",
                Part::text(script)
                    .file_name("worker.js")
                    .mime_str("application/javascript+module")
                    .map_err(serialization)?,
            );
        let request = self
            .client
            .put(format!("{}/scripts/{name}", self.account_url()))
            .bearer_auth(&self.credentials.api_token)
            .multipart(form);
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "PUT", "upload script").await?;
        require_cloudflare_result(PROVIDER, "Upload script", status, &text)
    }

    async fn account_subdomain(&self) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/subdomain", self.account_url()))
            .bearer_auth(&self.credentials.api_token);
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "GET", "subdomain", 2)
                .await?;
        let subdomain: WorkersSubdomain =
            require_cloudflare_result(PROVIDER, "Get workers.dev subdomain", status, &text)?;
        Ok(subdomain.subdomain)
    }

    async fn enable_workers_dev(&self, name: &str) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/scripts/{name}/subdomain", self.account_url()))
            .bearer_auth(&self.credentials.api_token)
            .json(&serde_json::json!({ "enabled": true }));
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "POST", "enable subdomain", 2)
                .await?;
        cloudflare_result::<serde_json::Value>(PROVIDER, "Enable workers.dev route", status, &text)?;
        Ok(())
    }
}

#[async_trait]
impl TargetAdapter for CloudflareWorkersAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::CloudflareWorkers
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        let name = resource_name(
            self.credentials.worker_name.as_deref(),
            site,
            WORKER_NAME_MAX,
        );
        let script = build_worker_script(artifact)?;
        log::info!(
            "[{PROVIDER}] Uploading worker {name} ({} bytes of script)",
            script.len()
        );
        let uploaded = self.upload_script(&name, script).await?;

        if let Err(e) = self.enable_workers_dev(&name).await {
            log::warn!("[{PROVIDER}] Could not enable workers.dev route for {name}: {e}");
        }
        let subdomain = self.account_subdomain().await?;

        Ok(PublishOutcome {
            url: format!("https://{name}.{subdomain}.workers.dev"),
            deployment_id: uploaded.etag.or(uploaded.id),
            dns_target: Some(DnsTarget::Originless),
        })
    }
}
