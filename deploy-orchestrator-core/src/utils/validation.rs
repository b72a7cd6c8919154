//! Record shape validation, run before every DNS write

use std::net::{Ipv4Addr, Ipv6Addr};

use deploy_orchestrator_provider::{DnsRecordInput, DnsRecordType, Ttl};

use crate::error::{CoreError, CoreResult};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MAX_TXT_LEN: usize = 2048;

fn invalid(detail: impl Into<String>) -> CoreError {
    CoreError::ValidationError(detail.into())
}

/// Hostname made of `[A-Za-z0-9_-]` labels; a trailing dot is accepted.
pub fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    !value.is_empty()
        && value.len() <= MAX_NAME_LEN
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= MAX_LABEL_LEN
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Trimmed, lowercase domain without the trailing dot.
pub fn normalize_domain(domain: &str) -> CoreResult<String> {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return Err(invalid("Domain is required"));
    }
    if !is_hostname(&domain) {
        return Err(invalid(format!("Invalid domain: {domain}")));
    }
    Ok(domain)
}

/// Record name relative to the zone: `@`, a label path, optionally with a leading `*.`.
fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(invalid("Record name is required"));
    }
    if name == "@" || name == "*" {
        return Ok(());
    }
    let rest = name.strip_prefix("*.").unwrap_or(name);
    if !is_hostname(rest) {
        return Err(invalid(format!("Invalid record name: {name}")));
    }
    Ok(())
}

fn validate_ttl(ttl: Ttl) -> CoreResult<()> {
    match ttl {
        Ttl::Auto => Ok(()),
        Ttl::Seconds(s) if (Ttl::MIN_SECONDS..=Ttl::MAX_SECONDS).contains(&s) => Ok(()),
        Ttl::Seconds(s) => Err(invalid(format!(
            "TTL must be between {} and {} seconds (got {s})",
            Ttl::MIN_SECONDS,
            Ttl::MAX_SECONDS
        ))),
    }
}

fn validate_content(record_type: DnsRecordType, content: &str, priority: Option<u16>) -> CoreResult<()> {
    if content.is_empty() {
        return Err(invalid("Record content is required"));
    }
    match record_type {
        DnsRecordType::A => {
            content
                .parse::<Ipv4Addr>()
                .map_err(|_| invalid(format!("A record requires an IPv4 address, got '{content}'")))?;
        }
        DnsRecordType::Aaaa => {
            content.parse::<Ipv6Addr>().map_err(|_| {
                invalid(format!("AAAA record requires an IPv6 address, got '{content}'"))
            })?;
        }
        DnsRecordType::Cname => {
            if content == "@" {
                return Err(invalid(
                    "CNAME target must be a hostname, not the apex alias '@'",
                ));
            }
            if !is_hostname(content) {
                return Err(invalid(format!("Invalid CNAME target: {content}")));
            }
        }
        DnsRecordType::Ns => {
            if !is_hostname(content) {
                return Err(invalid(format!("Invalid nameserver: {content}")));
            }
        }
        DnsRecordType::Mx => {
            if !priority.is_some_and(|p| p > 0) {
                return Err(invalid("MX record requires a positive priority"));
            }
            if !is_hostname(content) {
                return Err(invalid(format!("Invalid mail server: {content}")));
            }
        }
        DnsRecordType::Srv => {
            let parts: Vec<&str> = content.split_whitespace().collect();
            let valid = match parts.as_slice() {
                [weight, port, target] => {
                    weight.parse::<u16>().is_ok() && port.parse::<u16>().is_ok() && is_hostname(target)
                }
                _ => false,
            };
            if !valid {
                return Err(invalid("SRV content must be '<weight> <port> <target>'"));
            }
        }
        DnsRecordType::Txt => {
            if content.len() > MAX_TXT_LEN {
                return Err(invalid(format!(
                    "TXT content exceeds {MAX_TXT_LEN} characters"
                )));
            }
        }
        DnsRecordType::Caa => {
            let mut parts = content.splitn(3, char::is_whitespace);
            let valid = matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(flags), Some(tag), Some(_)) if flags.parse::<u8>().is_ok() && !tag.is_empty()
            );
            if !valid {
                return Err(invalid("CAA content must be '<flags> <tag> \"<value>\"'"));
            }
        }
    }
    Ok(())
}

/// Check a record's shape and return the sanitized copy that may be submitted.
///
/// Sanitizing trims name and content (and the trailing dot of name-valued content),
/// drops `proxied` for types the proxy cannot serve, drops `priority` outside MX/SRV
/// and sets automatic TTL on proxied records.
pub fn validate_record(input: &DnsRecordInput) -> CoreResult<DnsRecordInput> {
    let mut record = input.clone();
    record.name = record.name.trim().to_string();
    record.content = record.content.trim().to_string();
    if matches!(
        record.record_type,
        DnsRecordType::Cname | DnsRecordType::Ns | DnsRecordType::Mx
    ) && record.content.len() > 1
    {
        record.content = record.content.trim_end_matches('.').to_string();
    }

    if !record.record_type.supports_proxy() {
        record.proxied = None;
    }
    if !record.record_type.uses_priority() {
        record.priority = None;
    }
    if record.proxied == Some(true) {
        record.ttl = Ttl::Auto;
    }

    validate_name(&record.name)?;
    validate_ttl(record.ttl)?;
    validate_content(record.record_type, &record.content, record.priority)?;
    Ok(record)
}
