//! # deploy-orchestrator-provider
//!
//! Remote-service layer of the deploy orchestrator: one adapter per hosting target
//! plus the Cloudflare DNS client used to point domains at deployments.
//!
//! ## Hosting Targets
//!
//! | Target | Slug | Transport | DNS after deploy |
//! |--------|------|-----------|------------------|
//! | Cloudflare Pages | `cf-pages` | Direct upload (MD5 assets + manifest) | CNAME `@`/`www` → `<project>.pages.dev` |
//! | Netlify | `netlify` | File-digest deploy (SHA1) | CNAME `@`/`www` → site host |
//! | Cloudflare Workers | `cf-workers` | Single ES module script | Proxied AAAA `@` → `100::` |
//! | S3 + CloudFront | `s3-cloudfront` | SigV4 `PUT` per object, optional invalidation | CNAME `@` → distribution |
//! | VPS (SSH) | `vps-ssh` | Deploy proxy `/api/deploy/vps` | A `@` → server address |
//! | Git push | `git-push` | Deploy proxy `/api/deploy/git-push` | none |
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)*: Use rustls.
//! - **`native-tls`**: Use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use deploy_orchestrator_provider::{
//!     create_target_adapter, Artifact, CloudflarePagesCredentials, DeployCredentials, SiteContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = create_target_adapter(DeployCredentials::CloudflarePages(
//!         CloudflarePagesCredentials {
//!             account_id: "0123456789abcdef0123456789abcdef".to_string(),
//!             api_token: "your-token".to_string(),
//!             project_name: None,
//!         },
//!     ))?;
//!
//!     let artifact = Artifact::single_page("<h1>Hello</h1>");
//!     let site = SiteContext::new("site-1").with_domain("example.com");
//!     let outcome = adapter.publish(&artifact, &site).await?;
//!     println!("live at {}", outcome.url);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, ProviderError>`](ProviderError).
//!
//! - [`ProviderError::MissingCredentials`]: a required credential field is empty or malformed
//! - [`ProviderError::InvalidCredentials`]: the remote service rejected the credentials
//! - [`ProviderError::PublishRejected`]: a deploy step answered with a failure
//! - [`ProviderError::ZoneNotFound`]: no zone for the domain in the account
//!
//! Transient errors (`NetworkError`, `Timeout`, `RateLimited`) on idempotent calls are
//! retried with exponential backoff.

mod error;
mod factory;
mod http_client;
mod providers;
mod targets;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use factory::{create_dns_provider, create_target_adapter};

pub use traits::{DnsProvider, TargetAdapter};

pub use types::{
    Artifact, BatchCreateFailure, BatchCreateResult, CloudflarePagesCredentials,
    CloudflareWorkersCredentials, DeployCredentials, DeploymentTarget, DnsCredentials, DnsRecord,
    DnsRecordInput, DnsRecordType, DnsTarget, GitPushCredentials, NetlifyCredentials,
    PublishOutcome, S3Credentials, SiteContext, Ttl, UnknownTarget, VpsAuth, VpsCredentials, Zone,
    ZoneStatus,
};

pub use providers::CloudflareDnsClient;
pub use targets::{
    CloudflarePagesAdapter, CloudflareWorkersAdapter, GitPushAdapter, NetlifyAdapter,
    S3CloudfrontAdapter, VpsAdapter,
};

pub use utils::log_sanitizer::mask_secret;
