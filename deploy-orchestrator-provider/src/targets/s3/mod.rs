//! S3 static hosting with optional CloudFront invalidation.
//!
//! Every request is signed with SigV4. Uploads go to the bucket; the distribution
//! step is best effort and never fails a publish that already reached the bucket.

mod sign;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::providers::common::{content_type_for, create_http_client, sha256_hex, trim_base_url};
use crate::traits::TargetAdapter;
use crate::types::{
    Artifact, DeploymentTarget, DnsTarget, PublishOutcome, S3Credentials, SiteContext,
};

use sign::{SigV4Signer, SignableRequest};

const PROVIDER: &str = "s3-cloudfront";
const CLOUDFRONT_API_BASE: &str = "https://cloudfront.amazonaws.com";
const CLOUDFRONT_API_VERSION: &str = "2020-05-31";
/// CloudFront is a global service signed in us-east-1.
const CLOUDFRONT_REGION: &str = "us-east-1";

/// Publishes to an S3 bucket and optionally invalidates a CloudFront distribution.
pub struct S3CloudfrontAdapter {
    client: Client,
    credentials: S3Credentials,
    /// Custom S3 endpoint; switches to path-style addressing.
    endpoint: Option<String>,
    cloudfront_base_url: String,
}

/// `scheme://authority` and the authority alone.
fn split_endpoint(endpoint: &str) -> (&str, &str) {
    let authority = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default();
    (endpoint, authority)
}

/// Percent-encode each key segment, keeping the separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Text of the first `<tag>` element in an XML document.
fn xml_element<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(xml[start..end].trim())
}

fn invalidation_body(caller_reference: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <InvalidationBatch xmlns=\"http://cloudfront.amazonaws.com/doc/{CLOUDFRONT_API_VERSION}/\">\
         <Paths><Quantity>1</Quantity><Items><Path>/*</Path></Items></Paths>\
         <CallerReference>{}</CallerReference>\
         </InvalidationBatch>",
        xml_escape(caller_reference)
    )
}

impl S3CloudfrontAdapter {
    pub fn new(credentials: S3Credentials) -> Self {
        Self {
            client: create_http_client(),
            credentials,
            endpoint: None,
            cloudfront_base_url: CLOUDFRONT_API_BASE.to_string(),
        }
    }

    /// Use an S3-compatible endpoint with path-style bucket addressing.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(trim_base_url(endpoint));
        self
    }

    #[must_use]
    pub fn with_cloudfront_base_url(mut self, base_url: &str) -> Self {
        self.cloudfront_base_url = trim_base_url(base_url);
        self
    }

    fn signer<'a>(&'a self, region: &'a str, service: &'a str) -> SigV4Signer<'a> {
        SigV4Signer {
            access_key_id: &self.credentials.access_key_id,
            secret_access_key: &self.credentials.secret_access_key,
            region,
            service,
        }
    }

    /// Request URL, canonical path and host header for an object key.
    fn object_location(&self, key: &str) -> (String, String, String) {
        let encoded = encode_key(key);
        match &self.endpoint {
            Some(endpoint) => {
                let (base, authority) = split_endpoint(endpoint);
                let path = format!("/{}/{encoded}", self.credentials.bucket);
                (format!("{base}{path}"), path, authority.to_string())
            }
            None => {
                let host = format!(
                    "{}.s3.{}.amazonaws.com",
                    self.credentials.bucket, self.credentials.region
                );
                let path = format!("/{encoded}");
                (format!("https://{host}{path}"), path, host)
            }
        }
    }

    fn website_url(&self) -> String {
        format!(
            "http://{}.s3-website-{}.amazonaws.com",
            self.credentials.bucket, self.credentials.region
        )
    }

    async fn put_object(&self, key: &str, content: &[u8]) -> Result<()> {
        let (url, path, host) = self.object_location(key);
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = sha256_hex(content);
        let content_type = content_type_for(key);

        let headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let authorization = self.signer(&self.credentials.region, "s3").authorization(
            &SignableRequest {
                method: "PUT",
                path: &path,
                query: "",
                headers: &headers,
                payload_hash: &payload_hash,
            },
            &amz_date,
        );

        let request = self
            .client
            .put(url)
            .header("Authorization", authorization)
            .header("Content-Type", content_type)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .body(content.to_vec());
        let (status, text) = HttpUtils::execute_request(request, PROVIDER, "PUT", key).await?;
        if status == 403 {
            return Err(ProviderError::InvalidCredentials {
                provider: PROVIDER.to_string(),
                raw_message: xml_element(&text, "Message").map(str::to_string),
            });
        }
        HttpUtils::ensure_success(PROVIDER, "Upload object", status, &text)
    }

    async fn cloudfront_request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
    ) -> Result<(u16, String)> {
        let (base, authority) = split_endpoint(&self.cloudfront_base_url);
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload = body.unwrap_or_default();
        let payload_hash = sha256_hex(payload.as_bytes());

        let headers = vec![
            ("host".to_string(), authority.to_string()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let authorization = self.signer(CLOUDFRONT_REGION, "cloudfront").authorization(
            &SignableRequest {
                method,
                path,
                query: "",
                headers: &headers,
                payload_hash: &payload_hash,
            },
            &amz_date,
        );

        let url = format!("{base}{path}");
        let builder = if method == "POST" {
            self.client
                .post(url)
                .header("Content-Type", "application/xml")
                .body(payload)
        } else {
            self.client.get(url)
        };
        let request = builder
            .header("Authorization", authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date);
        HttpUtils::execute_request(request, PROVIDER, method, "cloudfront").await
    }

    async fn invalidate(&self, distribution_id: &str) -> Result<Option<String>> {
        let path = format!("/{CLOUDFRONT_API_VERSION}/distribution/{distribution_id}/invalidation");
        let caller_reference = format!("deploy-{}", Utc::now().timestamp_millis());
        let (status, text) = self
            .cloudfront_request("POST", &path, Some(invalidation_body(&caller_reference)))
            .await?;
        HttpUtils::ensure_success(PROVIDER, "Create invalidation", status, &text)?;
        Ok(xml_element(&text, "Id").map(str::to_string))
    }

    async fn distribution_domain(&self, distribution_id: &str) -> Result<Option<String>> {
        let path = format!("/{CLOUDFRONT_API_VERSION}/distribution/{distribution_id}");
        let (status, text) = self.cloudfront_request("GET", &path, None).await?;
        HttpUtils::ensure_success(PROVIDER, "Get distribution", status, &text)?;
        Ok(xml_element(&text, "DomainName").map(str::to_string))
    }
}

#[async_trait]
impl TargetAdapter for S3CloudfrontAdapter {
    fn target(&self) -> DeploymentTarget {
        DeploymentTarget::S3Cloudfront
    }

    async fn publish(&self, artifact: &Artifact, site: &SiteContext) -> Result<PublishOutcome> {
        log::info!(
            "[{PROVIDER}] Uploading {} files for {} to bucket {}",
            artifact.len(),
            site.site_id,
            self.credentials.bucket
        );
        for (key, content) in artifact.iter() {
            self.put_object(key, content).await?;
        }

        let Some(distribution_id) = self.credentials.distribution_id.as_deref() else {
            let url = self.website_url();
            let host = url.trim_start_matches("http://").to_string();
            return Ok(PublishOutcome {
                url,
                deployment_id: None,
                dns_target: Some(DnsTarget::Alias {
                    host,
                    include_www: false,
                    proxiable: false,
                }),
            });
        };

        let invalidation_id = match self.invalidate(distribution_id).await {
            Ok(id) => id,
            Err(e) => {
                log::warn!("[{PROVIDER}] Invalidation of {distribution_id} failed: {e}");
                None
            }
        };
        let host = match self.distribution_domain(distribution_id).await {
            Ok(Some(domain)) => domain,
            Ok(None) => self.website_url().trim_start_matches("http://").to_string(),
            Err(e) => {
                log::warn!("[{PROVIDER}] Could not read distribution {distribution_id}: {e}");
                self.website_url().trim_start_matches("http://").to_string()
            }
        };

        let url = if host.ends_with(".cloudfront.net") {
            format!("https://{host}")
        } else {
            format!("http://{host}")
        };
        Ok(PublishOutcome {
            url,
            deployment_id: invalidation_id,
            dns_target: Some(DnsTarget::Alias {
                host,
                include_www: false,
                proxiable: false,
            }),
        })
    }
}
