//! Public data types shared by the DNS client and the target adapters.

mod deploy;
mod dns;

pub use deploy::{
    Artifact, CloudflarePagesCredentials, CloudflareWorkersCredentials, DeployCredentials,
    DeploymentTarget, DnsTarget, GitPushCredentials, NetlifyCredentials, PublishOutcome,
    S3Credentials, SiteContext, UnknownTarget, VpsAuth, VpsCredentials,
};
pub use dns::{
    BatchCreateFailure, BatchCreateResult, DnsCredentials, DnsRecord, DnsRecordInput, DnsRecordType,
    Ttl, Zone, ZoneStatus,
};
