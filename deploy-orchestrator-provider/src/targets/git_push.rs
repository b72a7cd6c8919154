//! Commit the artifact to a git repository through the deploy proxy.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::providers::common::{create_http_client, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{Artifact, DeploymentTarget, GitPushCredentials, PublishOutcome, SiteContext};

use super::support::{EncodedFile, encode_files, proxy_result};

const PROVIDER: &str = "git-push";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GitPushRequest<'a> {
    repo_url: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subdirectory: Option<&'a str>,
    site_name: String,
    commit_message: String,
    files: Vec<EncodedFile>,
}

/// Pushes the artifact as a commit; hosting is left to whatever watches the repository.
pub struct GitPushAdapter {
    client: Client,
    credentials: GitPushCredentials,
}

impl GitPushAdapter {
    pub fn new(credentials: GitPushCredentials) -> Self {
        Self {
            client: create_http_client(),
            credentials,
        }
    }
}

#[async_trait]
impl TargetAdapter for GitPushAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::GitPush
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        let creds = &self.credentials;
        let label = site
            .domain
            .as_deref()
            .or(site.brand_name.as_deref())
            .unwrap_or(&site.site_id);
        let body = GitPushRequest {
            repo_url: &creds.repo_url,
            branch: &creds.branch,
            token: creds.token.as_deref(),
            subdirectory: creds.subdirectory.as_deref().filter(|s| !s.is_empty()),
            site_name: site.slug(),
            commit_message: format!("Deploy {label}"),
            files: encode_files(artifact),
        };

        log::info!(
            "[{PROVIDER}] Pushing {} files to {} ({})",
            artifact.len(),
            creds.repo_url,
            creds.branch
        );
        let request = self
            .client
            .post(format!(
                "{}/api/deploy/git-push",
                trim_base_url(&creds.proxy_url)
            ))
            .json(&body);
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "deploy/git-push").await?;
        let response = proxy_result(PROVIDER, "Git push", status, &text)?;

        Ok(PublishOutcome {
            url: response
                .url
                .or_else(|| response.commit_url.clone())
                .unwrap_or_else(|| creds.repo_url.clone()),
            deployment_id: response.commit_url,
            dns_target: None,
        })
    }
}
