pub(crate) mod cloudflare;
pub(crate) mod common;

pub use cloudflare::CloudflareDnsClient;
