use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Hosting targets an artifact can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeploymentTarget {
    #[serde(rename = "cf-pages")]
    CloudflarePages,
    #[serde(rename = "netlify")]
    Netlify,
    #[serde(rename = "cf-workers")]
    CloudflareWorkers,
    #[serde(rename = "s3-cloudfront")]
    S3Cloudfront,
    #[serde(rename = "vps-ssh")]
    VpsSsh,
    #[serde(rename = "git-push")]
    GitPush,
}

impl DeploymentTarget {
    pub const ALL: [Self; 6] = [
        Self::CloudflarePages,
        Self::Netlify,
        Self::CloudflareWorkers,
        Self::S3Cloudfront,
        Self::VpsSsh,
        Self::GitPush,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::CloudflarePages => "cf-pages",
            Self::Netlify => "netlify",
            Self::CloudflareWorkers => "cf-workers",
            Self::S3Cloudfront => "s3-cloudfront",
            Self::VpsSsh => "vps-ssh",
            Self::GitPush => "git-push",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::CloudflarePages => "Cloudflare Pages",
            Self::Netlify => "Netlify",
            Self::CloudflareWorkers => "Cloudflare Workers",
            Self::S3Cloudfront => "AWS S3 + CloudFront",
            Self::VpsSsh => "VPS (SSH)",
            Self::GitPush => "Git push",
        }
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a target slug is not one of [`DeploymentTarget::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown deploy target: {}", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for DeploymentTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTarget(wanted.to_string()))
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudflarePagesCredentials {
    pub account_id: String,
    pub api_token: String,
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetlifyCredentials {
    pub api_token: String,
    #[serde(default)]
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudflareWorkersCredentials {
    pub account_id: String,
    pub api_token: String,
    #[serde(default)]
    pub worker_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    /// CloudFront distribution to invalidate after upload.
    #[serde(default)]
    pub distribution_id: Option<String>,
}

/// How the deploy proxy authenticates against the VPS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum VpsAuth {
    Password { password: String },
    PrivateKey { private_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpsCredentials {
    /// Base URL of the deploy proxy that performs the SSH transfer.
    pub proxy_url: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    pub auth: VpsAuth,
    pub remote_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPushCredentials {
    /// Base URL of the deploy proxy that performs the push.
    pub proxy_url: String,
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Directory inside the repository the artifact is written to.
    #[serde(default)]
    pub subdirectory: Option<String>,
}

/// Per-target credentials. Owned by the caller and passed into each dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target")]
pub enum DeployCredentials {
    #[serde(rename = "cf-pages")]
    CloudflarePages(CloudflarePagesCredentials),
    #[serde(rename = "netlify")]
    Netlify(NetlifyCredentials),
    #[serde(rename = "cf-workers")]
    CloudflareWorkers(CloudflareWorkersCredentials),
    #[serde(rename = "s3-cloudfront")]
    S3Cloudfront(S3Credentials),
    #[serde(rename = "vps-ssh")]
    VpsSsh(VpsCredentials),
    #[serde(rename = "git-push")]
    GitPush(GitPushCredentials),
}

fn require(provider: DeploymentTarget, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProviderError::MissingCredentials {
            provider: provider.slug().to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_cf_account_id(provider: DeploymentTarget, account_id: &str) -> Result<()> {
    let account_id = account_id.trim();
    if account_id.len() != 32 || !account_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ProviderError::MissingCredentials {
            provider: provider.slug().to_string(),
            field: "account_id".to_string(),
        });
    }
    Ok(())
}

impl DeployCredentials {
    pub fn target(&self) -> DeploymentTarget {
        match self {
            Self::CloudflarePages(_) => DeploymentTarget::CloudflarePages,
            Self::Netlify(_) => DeploymentTarget::Netlify,
            Self::CloudflareWorkers(_) => DeploymentTarget::CloudflareWorkers,
            Self::S3Cloudfront(_) => DeploymentTarget::S3Cloudfront,
            Self::VpsSsh(_) => DeploymentTarget::VpsSsh,
            Self::GitPush(_) => DeploymentTarget::GitPush,
        }
    }

    /// Check required fields locally, before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        let target = self.target();
        match self {
            Self::CloudflarePages(c) => {
                require_cf_account_id(target, &c.account_id)?;
                require(target, "api_token", &c.api_token)
            }
            Self::Netlify(c) => require(target, "api_token", &c.api_token),
            Self::CloudflareWorkers(c) => {
                require_cf_account_id(target, &c.account_id)?;
                require(target, "api_token", &c.api_token)
            }
            Self::S3Cloudfront(c) => {
                require(target, "access_key_id", &c.access_key_id)?;
                require(target, "secret_access_key", &c.secret_access_key)?;
                require(target, "bucket", &c.bucket)?;
                require(target, "region", &c.region)
            }
            Self::VpsSsh(c) => {
                require(target, "proxy_url", &c.proxy_url)?;
                require(target, "host", &c.host)?;
                require(target, "user", &c.user)?;
                require(target, "remote_path", &c.remote_path)?;
                match &c.auth {
                    VpsAuth::Password { password } => require(target, "password", password),
                    VpsAuth::PrivateKey { private_key } => {
                        require(target, "private_key", private_key)
                    }
                }
            }
            Self::GitPush(c) => {
                require(target, "proxy_url", &c.proxy_url)?;
                require(target, "repo_url", &c.repo_url)?;
                require(target, "branch", &c.branch)
            }
        }
    }
}

/// A rendered static site: path → bytes. Paths are stored without a leading `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    files: BTreeMap<String, Vec<u8>>,
}

impl Artifact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-page artifact, the common case for generated landing pages.
    pub fn single_page(html: impl Into<Vec<u8>>) -> Self {
        let mut artifact = Self::new();
        artifact.insert("index.html", html);
        artifact
    }

    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .insert(path.trim_start_matches('/').to_string(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files
            .get(path.trim_start_matches('/'))
            .map(Vec::as_slice)
    }

    pub fn index_html(&self) -> Option<&[u8]> {
        self.get("index.html")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Copy `filename` to `index.html` when the artifact has no index page yet.
    ///
    /// Returns `false` if neither exists.
    pub fn ensure_index(&mut self, filename: &str) -> bool {
        if self.index_html().is_some() {
            return true;
        }
        match self.get(filename).map(<[u8]>::to_vec) {
            Some(content) => {
                self.insert("index.html", content);
                true
            }
            None => false,
        }
    }
}

impl<P: AsRef<str>, C: Into<Vec<u8>>> FromIterator<(P, C)> for Artifact {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut artifact = Self::new();
        for (path, content) in iter {
            artifact.insert(path.as_ref(), content);
        }
        artifact
    }
}

/// What a deployment is for: the site identity used for naming and the DNS step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContext {
    pub site_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// File served as the entry page when the artifact has no `index.html`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_filename: Option<String>,
}

const SLUG_MAX_LEN: usize = 40;

impl SiteContext {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand_name = Some(brand.into());
        self
    }

    #[must_use]
    pub fn with_html_filename(mut self, filename: impl Into<String>) -> Self {
        self.html_filename = Some(filename.into());
        self
    }

    /// Lowercase `[a-z0-9-]` name derived from the domain, then the brand, then the id.
    pub fn slug(&self) -> String {
        let source = self
            .domain
            .as_deref()
            .or(self.brand_name.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.site_id);

        let mut slug = String::with_capacity(source.len());
        for c in source.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug: String = slug.trim_matches('-').chars().take(SLUG_MAX_LEN).collect();
        let slug = slug.trim_end_matches('-');
        if slug.is_empty() {
            "site".to_string()
        } else {
            slug.to_string()
        }
    }
}

/// Where the apex of the site's domain should point after a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsTarget {
    /// CNAME to a provider hostname.
    Alias {
        host: String,
        include_www: bool,
        proxiable: bool,
    },
    /// A/AAAA to a fixed address.
    Address(IpAddr),
    /// A record to whatever the hostname currently resolves to.
    Hostname(String),
    /// Proxied placeholder record; the provider routes by hostname.
    Originless,
}

/// Successful publish, as reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Live URL of the deployment.
    pub url: String,
    pub deployment_id: Option<String>,
    /// `None` when the target does not expose a DNS endpoint.
    pub dns_target: Option<DnsTarget>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn target_slugs_round_trip() {
        for target in DeploymentTarget::ALL {
            assert_eq!(target.slug().parse::<DeploymentTarget>().unwrap(), target);
            let json = serde_json::to_string(&target).unwrap();
            assert_eq!(json, format!("\"{}\"", target.slug()));
        }
    }

    #[test]
    fn ensure_index_copies_named_page() {
        let mut artifact: Artifact = [("landing.html", "<p>x</p>")].into_iter().collect();
        assert!(artifact.ensure_index("landing.html"));
        assert_eq!(artifact.index_html(), Some(b"<p>x</p>".as_slice()));
        assert_eq!(artifact.len(), 2);

        let mut empty = Artifact::new();
        assert!(!empty.ensure_index("missing.html"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = "vercel".parse::<DeploymentTarget>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown deploy target: vercel");
    }

    #[test]
    fn credentials_report_their_target() {
        let creds = DeployCredentials::Netlify(NetlifyCredentials {
            api_token: "tok".into(),
            site_name: None,
        });
        assert_eq!(creds.target(), DeploymentTarget::Netlify);
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn cloudflare_account_id_must_be_hex32() {
        let creds = DeployCredentials::CloudflarePages(CloudflarePagesCredentials {
            account_id: "not-an-account".into(),
            api_token: "tok".into(),
            project_name: None,
        });
        assert!(matches!(
            creds.validate(),
            Err(ProviderError::MissingCredentials { ref field, .. }) if field == "account_id"
        ));
    }

    #[test]
    fn empty_s3_bucket_is_missing() {
        let creds = DeployCredentials::S3Cloudfront(S3Credentials {
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            bucket: " ".into(),
            region: "us-east-1".into(),
            distribution_id: None,
        });
        assert!(matches!(
            creds.validate(),
            Err(ProviderError::MissingCredentials { ref field, .. }) if field == "bucket"
        ));
    }

    #[test]
    fn credentials_deserialize_with_target_tag() {
        let creds: DeployCredentials = serde_json::from_value(serde_json::json!({
            "target": "vps-ssh",
            "proxy_url": "http://localhost:3001",
            "host": "203.0.113.7",
            "user": "deploy",
            "auth": { "method": "private-key", "private_key": "KEY" },
            "remote_path": "/var/www/site"
        }))
        .unwrap();
        let DeployCredentials::VpsSsh(vps) = creds else {
            panic!("expected vps credentials");
        };
        assert_eq!(vps.port, 22);
        assert!(matches!(vps.auth, VpsAuth::PrivateKey { .. }));
    }

    #[test]
    fn artifact_strips_leading_slash() {
        let artifact: Artifact = [("/index.html", "<h1>hi</h1>"), ("css/app.css", "body{}")]
            .into_iter()
            .collect();
        assert_eq!(artifact.len(), 2);
        assert_eq!(artifact.index_html(), Some("<h1>hi</h1>".as_bytes()));
        assert_eq!(artifact.paths().collect::<Vec<_>>(), vec!["css/app.css", "index.html"]);
    }

    #[test]
    fn slug_prefers_domain_then_brand() {
        let site = SiteContext::new("abc123")
            .with_domain("Shop.Example.com")
            .with_brand("Brand");
        assert_eq!(site.slug(), "shop-example-com");
        assert_eq!(SiteContext::new("abc123").with_brand("Joe's  Café").slug(), "joe-s-caf");
        assert_eq!(SiteContext::new("***").slug(), "site");
    }
}
