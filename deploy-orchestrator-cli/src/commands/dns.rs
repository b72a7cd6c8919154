//! `dns` commands

use std::net::Ipv4Addr;

use clap::{Args, Subcommand};
use serde_json::json;

use deploy_orchestrator_core::templates::{find_template, templates};
use deploy_orchestrator_core::types::{
    DnsCredentials, DnsRecord, DnsRecordInput, DnsRecordType, Ttl, Zone,
};

use crate::output::mark;
use crate::CommandContext;

/// DNS subcommands
#[derive(Debug, Subcommand)]
pub enum DnsCommands {
    /// List the records of a domain's zone
    List {
        #[command(flatten)]
        zone: ZoneArgs,

        /// Show the last fetched record set without calling the provider
        #[arg(long)]
        cached: bool,
    },

    /// Create or update the record with this type and name
    Upsert {
        #[command(flatten)]
        zone: ZoneArgs,

        #[command(flatten)]
        record: RecordArgs,
    },

    /// Delete a record by id
    Delete {
        #[command(flatten)]
        zone: ZoneArgs,

        /// Record id (see `dns list`)
        record_id: String,
    },

    /// Apply a built-in record template
    Template {
        #[command(flatten)]
        zone: ZoneArgs,

        /// Template id (see `dns templates`)
        template: String,

        /// Address for the template's A records
        #[arg(long)]
        ip: Option<Ipv4Addr>,
    },

    /// List the built-in templates
    Templates,

    /// Show a domain's zone and nameservers
    Zone {
        #[command(flatten)]
        zone: ZoneArgs,

        /// Add the domain to the account when no zone exists
        #[arg(long)]
        create: bool,
    },
}

#[derive(Debug, Args)]
pub struct ZoneArgs {
    /// Domain whose zone is addressed
    pub domain: String,

    /// DNS account id (defaults to `[dns] default_account`)
    #[arg(long)]
    pub account: Option<String>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Record type (A, AAAA, CNAME, MX, TXT, NS)
    #[arg(long = "type")]
    pub record_type: DnsRecordType,

    /// Name relative to the zone, `@` for the apex
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub content: String,

    /// `auto` or seconds
    #[arg(long, default_value = "auto")]
    pub ttl: Ttl,

    /// Route through the Cloudflare proxy
    #[arg(long)]
    pub proxied: bool,

    /// MX priority
    #[arg(long)]
    pub priority: Option<u16>,
}

impl RecordArgs {
    fn to_input(&self) -> DnsRecordInput {
        let mut input = DnsRecordInput::new(self.record_type, &self.name, &self.content)
            .with_ttl(self.ttl)
            .with_proxied(self.proxied);
        input.priority = self.priority;
        input
    }
}

pub(crate) async fn execute(command: DnsCommands, ctx: &CommandContext) -> anyhow::Result<bool> {
    let dns = &ctx.state.dns_service;
    match command {
        DnsCommands::List { zone, cached } => {
            let account = account(ctx, &zone)?;
            let found = dns.find_zone_by_domain(account, &zone.domain).await?;
            let records = if cached {
                match dns.cached_records(&found.id).await? {
                    Some(snapshot) => snapshot.records,
                    None => {
                        tracing::warn!("No cached records for {}", found.name);
                        Vec::new()
                    }
                }
            } else {
                dns.list_records(account, &found.id).await?
            };
            ctx.output.emit(&records, |records| {
                records.iter().map(record_line).collect()
            })?;
            Ok(true)
        }
        DnsCommands::Upsert { zone, record } => {
            let account = account(ctx, &zone)?;
            let found = dns.find_zone_by_domain(account, &zone.domain).await?;
            let outcome = dns.upsert_record(account, &found, &record.to_input()).await?;
            ctx.output.emit(&outcome, |o| {
                vec![format!("{:?}: {}", o.action, record_line(&o.record))]
            })?;
            Ok(true)
        }
        DnsCommands::Delete { zone, record_id } => {
            let account = account(ctx, &zone)?;
            let found = dns.find_zone_by_domain(account, &zone.domain).await?;
            dns.delete_record(account, &found.id, &record_id).await?;
            ctx.output.emit(&json!({ "deleted": record_id }), |_| {
                vec![format!("Deleted {record_id}")]
            })?;
            Ok(true)
        }
        DnsCommands::Template {
            zone,
            template,
            ip,
        } => {
            let template = find_template(&template)?;
            let account = account(ctx, &zone)?;
            let found = dns.find_zone_by_domain(account, &zone.domain).await?;
            let result = dns
                .apply_template(account, &found, &template.records(ip))
                .await?;
            ctx.output.emit(&result, |r| {
                let mut lines = vec![format!(
                    "{} {}: {} created, {} skipped, {} failed",
                    mark(r.is_complete()),
                    template.id,
                    r.created,
                    r.skipped,
                    r.failed.len()
                )];
                lines.extend(r.failed.iter().map(|f| {
                    format!("  {} {}: {}", f.record_type.as_str(), f.name, f.reason)
                }));
                lines
            })?;
            Ok(result.is_complete())
        }
        DnsCommands::Templates => {
            ctx.output.emit(templates(), |list| {
                list.iter()
                    .map(|t| {
                        format!(
                            "{:<14} {} ({} records)",
                            t.id,
                            t.description,
                            t.record_count()
                        )
                    })
                    .collect()
            })?;
            Ok(true)
        }
        DnsCommands::Zone { zone, create } => {
            let account = account(ctx, &zone)?;
            let found = if create {
                dns.find_or_create_zone(account, &zone.domain).await?
            } else {
                dns.find_zone_by_domain(account, &zone.domain).await?
            };
            ctx.output.emit(&found, zone_lines)?;
            Ok(true)
        }
    }
}

fn account<'a>(ctx: &'a CommandContext, zone: &ZoneArgs) -> anyhow::Result<&'a DnsCredentials> {
    Ok(ctx.credentials.dns_account(zone.account.as_deref())?)
}

fn record_line(record: &DnsRecord) -> String {
    let priority = record.priority.map(|p| format!(" [{p}]")).unwrap_or_default();
    let proxied = if record.proxied == Some(true) {
        " (proxied)"
    } else {
        ""
    };
    format!(
        "{:<6} {:<24} {}{priority} ttl={}{proxied}  id={}",
        record.record_type.as_str(),
        record.name,
        record.content,
        record.ttl,
        record.id
    )
}

fn zone_lines(zone: &Zone) -> Vec<String> {
    let nameservers = if zone.name_servers.is_empty() {
        "-".to_string()
    } else {
        zone.name_servers.join(", ")
    };
    vec![
        format!("{} ({:?})", zone.name, zone.status),
        format!("  id: {}", zone.id),
        format!("  nameservers: {nameservers}"),
    ]
}
