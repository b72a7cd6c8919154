//! VPS over SSH, performed by the deploy proxy.

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::providers::common::{create_http_client, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{
    Artifact, DeploymentTarget, DnsTarget, PublishOutcome, SiteContext, VpsAuth, VpsCredentials,
};

use super::support::{EncodedFile, encode_files, proxy_result};

const PROVIDER: &str = "vps-ssh";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VpsDeployRequest<'a> {
    host: &'a str,
    port: u16,
    user: &'a str,
    auth_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<&'a str>,
    remote_path: &'a str,
    site_name: String,
    files: Vec<EncodedFile>,
}

/// Copies the artifact to a server through the proxy's `/api/deploy/vps` endpoint.
pub struct VpsAdapter {
    client: Client,
    credentials: VpsCredentials,
}

impl VpsAdapter {
    pub fn new(credentials: VpsCredentials) -> Self {
        Self {
            client: create_http_client(),
            credentials,
        }
    }

    fn dns_target(&self) -> DnsTarget {
        let host = self.credentials.host.trim();
        match host.parse::<IpAddr>() {
            Ok(ip) => DnsTarget::Address(ip),
            Err(_) => DnsTarget::Hostname(host.to_string()),
        }
    }
}

#[async_trait]
impl TargetAdapter for VpsAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::VpsSsh
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        let creds = &self.credentials;
        let (auth_method, password, private_key) = match &creds.auth {
            VpsAuth::Password { password } => ("password", Some(password.as_str()), None),
            VpsAuth::PrivateKey { private_key } => ("key", None, Some(private_key.as_str())),
        };
        let body = VpsDeployRequest {
            host: &creds.host,
            port: creds.port,
            user: &creds.user,
            auth_method,
            password,
            private_key,
            remote_path: &creds.remote_path,
            site_name: site.slug(),
            files: encode_files(artifact),
        };

        log::info!(
            "[{PROVIDER}] Transferring {} files to {}@{}:{}",
            artifact.len(),
            creds.user,
            creds.host,
            creds.remote_path
        );
        let request = self
            .client
            .post(format!("{}/api/deploy/vps", trim_base_url(&creds.proxy_url)))
            .json(&body);
        let (status, text) =
            HttpUtils::execute_request(request, PROVIDER, "POST", "deploy/vps").await?;
        let response = proxy_result(PROVIDER, "VPS transfer", status, &text)?;

        Ok(PublishOutcome {
            url: response
                .url
                .unwrap_or_else(|| format!("http://{}/", creds.host.trim())),
            deployment_id: None,
            dns_target: Some(self.dns_target()),
        })
    }
}
