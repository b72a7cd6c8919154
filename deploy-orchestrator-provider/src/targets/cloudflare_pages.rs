//! Cloudflare Pages direct upload.
//!
//! Flow: ensure project → upload JWT → check missing hashes → upload missing assets →
//! upsert hashes → create deployment from a path→hash manifest.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use reqwest::Client;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::providers::common::{content_type_for, create_http_client, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{
    Artifact, CloudflarePagesCredentials, DeploymentTarget, DnsTarget, PublishOutcome,
    SiteContext,
};

use super::support::{cloudflare_result, require_cloudflare_result, resource_name};

const PROVIDER: &str = "cf-pages";
const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Pages project names are limited to 58 characters.
const PROJECT_NAME_MAX: usize = 58;
const PRODUCTION_BRANCH: &str = "main";

#[derive(Debug, Deserialize)]
struct UploadToken {
    jwt: String,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssetPayload<'a> {
    key: &'a str,
    value: String,
    metadata: AssetMetadata,
    base64: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetMetadata {
    content_type: &'static str,
}

/// One artifact file with its content hash.
struct HashedAsset<'a> {
    path: &'a str,
    content: &'a [u8],
    hash: String,
}

fn hash_assets(artifact: &Artifact) -> Vec<HashedAsset<'_>> {
    artifact
        .iter()
        .map(|(path, content)| HashedAsset {
            path,
            content,
            hash: hex::encode(Md5::digest(content)),
        })
        .collect()
}

/// Publishes to Cloudflare Pages through the direct-upload API.
pub struct CloudflarePagesAdapter {
    client: Client,
    credentials: CloudflarePagesCredentials,
    base_url: String,
}

impl CloudflarePagesAdapter {
    pub fn new(credentials: CloudflarePagesCredentials) -> Self {
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

    fn project_url(&self, project: &str) -> String {
        format!(
            "{}/accounts/{}/pages/projects/{project}",
            self.base_url, self.credentials.account_id
        )
    }

    async fn ensure_project(&self, project: &str) -> Result<()> {
        let request = self
            .client
            .get(self.project_url(project))
            .bearer_auth(&self.credentials.api_token);
        let (status, _) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "GET", "project", 2).await?;
        if (200..300).contains(&status) {
            return Ok(());
        }

        log::info!("[{PROVIDER}] Creating project {project}");
        let request = self
            .client
            .post(format!(
                "{}/accounts/{}/pages/projects",
                self.base_url, self.credentials.account_id
            ))
            .bearer_auth(&self.credentials.api_token)
            .json(&serde_json::json!({
                "name": project,
                "production_branch": PRODUCTION_BRANCH,
            }));
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "create project").await?;
        // 409: created concurrently, which is as good as created.
        if status == 409 {
            return Ok(());
        }
        cloudflare_result::<serde_json::Value>(PROVIDER, "Create project", status, &text)?;
        Ok(())
    }

    async fn upload_token(&self, project: &str) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/upload-token", self.project_url(project)))
            .bearer_auth(&self.credentials.api_token);
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "GET", "upload-token", 2)
                .await?;
        let token: UploadToken =
            require_cloudflare_result(PROVIDER, "Get upload token", status, &text)?;
        Ok(token.jwt)
    }

    async fn missing_hashes(&self, jwt: &str, assets: &[HashedAsset<'_>]) -> Result<Vec<String>> {
        let hashes: Vec<&str> = assets.iter().map(|a| a.hash.as_str()).collect();
        let request = self
            .client
            .post(format!("{}/pages/assets/check-missing", self.base_url))
            .bearer_auth(jwt)
            .json(&serde_json::json!({ "hashes": hashes }));
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "POST", "check-missing", 2)
                .await?;
        Ok(cloudflare_result(PROVIDER, "Check missing assets", status, &text)?.unwrap_or_default())
    }

    async fn upload_assets(&self, jwt: &str, assets: &[&HashedAsset<'_>]) -> Result<()> {
        if assets.is_empty() {
            return Ok(());
        }
        let payload: Vec<AssetPayload<'_>> = assets
            .iter()
            .map(|a| AssetPayload {
                key: &a.hash,
                value: BASE64.encode(a.content),
                metadata: AssetMetadata {
                    content_type: content_type_for(a.path),
                },
                base64: true,
            })
            .collect();
        let request = self
            .client
            .post(format!("{}/pages/assets/upload", self.base_url))
            .bearer_auth(jwt)
            .json(&payload);
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "assets/upload").await?;
        cloudflare_result::<serde_json::Value>(PROVIDER, "Upload assets", status, &text)?;
        Ok(())
    }

    async fn upsert_hashes(&self, jwt: &str, assets: &[HashedAsset<'_>]) -> Result<()> {
        let hashes: Vec<&str> = assets.iter().map(|a| a.hash.as_str()).collect();
        let request = self
            .client
            .post(format!("{}/pages/assets/upsert-hashes", self.base_url))
            .bearer_auth(jwt)
            .json(&serde_json::json!({ "hashes": hashes }));
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "POST", "upsert-hashes", 2)
                .await?;
        cloudflare_result::<serde_json::Value>(PROVIDER, "Upsert hashes", status, &text)?;
        Ok(())
    }

    async fn create_deployment(
        &self,
        project: &str,
        assets: &[HashedAsset<'_>],
    ) -> Result<Deployment> {
        let manifest: BTreeMap<String, &str> = assets
            .iter()
            .map(|a| (format!("/{}", a.path), a.hash.as_str()))
            .collect();
        let manifest = serde_json::to_string(&manifest).map_err(|e| {
            crate::error::ProviderError::SerializationError {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            }
        })?;
        let form = Form::new()
            .text("manifest", manifest)
            .text("branch", PRODUCTION_BRANCH);
        let request = self
            .client
            .post(format!("{}/deployments", self.project_url(project)))
            .bearer_auth(&self.credentials.api_token)
            .multipart(form);
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "create deployment").await?;
        require_cloudflare_result(PROVIDER, "Create deployment", status, &text)
    }
}

#[async_trait]
impl TargetAdapter for CloudflarePagesAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::CloudflarePages
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        let project = resource_name(
            self.credentials.project_name.as_deref(),
            site,
            PROJECT_NAME_MAX,
        );
        let assets = hash_assets(artifact);
        log::info!(
            "[{PROVIDER}] Publishing {} files ({} bytes) to project {project}",
            assets.len(),
            artifact.total_bytes()
        );

        self.ensure_project(&project).await?;
        let jwt = self.upload_token(&project).await?;

        let missing = self.missing_hashes(&jwt, &assets).await?;
        let to_upload: Vec<&HashedAsset<'_>> = assets
            .iter()
            .filter(|a| missing.contains(&a.hash))
            .collect();
        log::debug!("[{PROVIDER}] {} of {} assets missing", to_upload.len(), assets.len());
        self.upload_assets(&jwt, &to_upload).await?;
        self.upsert_hashes(&jwt, &assets).await?;

        let deployment = self.create_deployment(&project, &assets).await?;
        let host = format!("{project}.pages.dev");
        log::info!(
            "[{PROVIDER}] Deployment {} ready at {}",
            deployment.id,
            deployment.url.as_deref().unwrap_or(&host)
        );

        Ok(PublishOutcome {
            url: format!("https://{host}"),
            deployment_id: Some(deployment.id),
            dns_target: Some(DnsTarget::Alias {
                host,
                include_www: true,
                proxiable: true,
            }),
        })
    }
}
