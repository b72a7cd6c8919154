//! Hosting target adapters, one per [`DeploymentTarget`].

mod cloudflare_pages;
mod cloudflare_workers;
mod git_push;
mod netlify;
mod s3;
mod support;
mod vps;

pub use cloudflare_pages::CloudflarePagesAdapter;
pub use cloudflare_workers::CloudflareWorkersAdapter;
pub use git_push::GitPushAdapter;
pub use netlify::NetlifyAdapter;
pub use s3::S3CloudfrontAdapter;
pub use vps::VpsAdapter;
