//! Netlify file-digest deploys.
//!
//! The deploy is created with a path→SHA1 map; Netlify answers with the digests it
//! does not have yet and only those files are uploaded.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::providers::common::{create_http_client, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{
    Artifact, DeploymentTarget, DnsTarget, NetlifyCredentials, PublishOutcome, SiteContext,
};

use super::support::{resource_name, url_host};

const PROVIDER: &str = "netlify";
const NETLIFY_API_BASE: &str = "https://api.netlify.com/api/v1";
const SITE_NAME_MAX: usize = 63;

#[derive(Debug, Deserialize)]
struct NetlifySite {
    id: String,
    name: String,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NetlifyDeploy {
    id: String,
    #[serde(default)]
    required: Vec<String>,
}

/// Publishes to Netlify via the REST API.
pub struct NetlifyAdapter {
    client: Client,
    credentials: NetlifyCredentials,
    base_url: String,
}

impl NetlifyAdapter {
    pub fn new(credentials: NetlifyCredentials) -> Self {
        Self {
            client: create_http_client(),
            credentials,
            base_url: NETLIFY_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    async fn find_site(&self, name: &str) -> Result<Option<NetlifySite>> {
        let request = self
            .client
            .get(format!("{}/sites", self.base_url))
            .query(&[("name", name), ("filter", "all")])
            .bearer_auth(&self.credentials.api_token);
        let (status, text) =
            HttpUtils::execute_request_with_retry(request, PROVIDER, "GET", "sites", 2).await?;
        HttpUtils::ensure_success(PROVIDER, "Look up site", status, &text)?;
        let sites: Vec<NetlifySite> = HttpUtils::parse_json(&text, PROVIDER)?;
        Ok(sites.into_iter().find(|s| s.name == name))
    }

    async fn create_site(&self, name: &str) -> Result<NetlifySite> {
        log::info!("[{PROVIDER}] Creating site {name}");
        let request = self
            .client
            .post(format!("{}/sites", self.base_url))
            .bearer_auth(&self.credentials.api_token)
            .json(&serde_json::json!({ "name": name }));
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "create site").await?;
        HttpUtils::ensure_success(PROVIDER, "Create site", status, &text)?;
        HttpUtils::parse_json(&text, PROVIDER)
    }

    async fn create_deploy(
        &self,
        site_id: &str,
        digests: &BTreeMap<String, String>,
    ) -> Result<NetlifyDeploy> {
        let request = self
            .client
            .post(format!("{}/sites/{site_id}/deploys", self.base_url))
            .bearer_auth(&self.credentials.api_token)
            .json(&serde_json::json!({ "files": digests }));
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "create deploy").await?;
        HttpUtils::ensure_success(PROVIDER, "Create deploy", status, &text)?;
        HttpUtils::parse_json(&text, PROVIDER)
    }

    async fn upload_file(&self, deploy_id: &str, path: &str, content: &[u8]) -> Result<()> {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let request = self
            .client
            .put(format!(
                "{}/deploys/{deploy_id}/files/{}",
                self.base_url,
                encoded.join("/")
            ))
            .bearer_auth(&self.credentials.api_token)
            .header("Content-Type", "application/octet-stream")
            .body(content.to_vec());
        let (status, text) = HttpUtils::execute_request(request, PROVIDER, "PUT", path).await?;
        HttpUtils::ensure_success(PROVIDER, "Upload file", status, &text)
    }
}

#[async_trait]
impl TargetAdapter for NetlifyAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::Netlify
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        let name = resource_name(self.credentials.site_name.as_deref(), site, SITE_NAME_MAX);
        let netlify_site = match self.find_site(&name).await? {
            Some(existing) => existing,
            None => self.create_site(&name).await?,
        };

        let digests: BTreeMap<String, String> = artifact
            .iter()
            .map(|(path, content)| (format!("/{path}"), hex::encode(Sha1::digest(content))))
            .collect();
        let deploy = self.create_deploy(&netlify_site.id, &digests).await?;
        log::info!(
            "[{PROVIDER}] Deploy {} needs {} of {} files",
            deploy.id,
            deploy.required.len(),
            digests.len()
        );

        for (path, content) in artifact.iter() {
            let Some(digest) = digests.get(&format!("/{path}")) else {
                continue;
            };
            if deploy.required.contains(digest) {
                self.upload_file(&deploy.id, path, content).await?;
            }
        }

        let url = netlify_site
            .ssl_url
            .or(netlify_site.url)
            .unwrap_or_else(|| format!("https://{}.netlify.app", netlify_site.name));
        let host = url_host(&url).ok_or_else(|| ProviderError::ParseError {
            provider: PROVIDER.to_string(),
            detail: format!("site URL has no host: {url}"),
        })?;

        Ok(PublishOutcome {
            url,
            deployment_id: Some(deploy.id),
            dns_target: Some(DnsTarget::Alias {
                host,
                include_www: true,
                proxiable: false,
            }),
        })
    }
}
