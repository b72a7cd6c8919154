//! Built-in DNS record templates

use std::net::Ipv4Addr;

use serde::Serialize;

use deploy_orchestrator_provider::{DnsRecordInput, DnsRecordType, Ttl};

use crate::error::{CoreError, CoreResult};

/// Address used for `A @` when the caller gives none (TEST-NET-1).
pub const DEFAULT_TARGET_IP: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

const TEMPLATE_TTL: Ttl = Ttl::Seconds(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    /// The caller's target address.
    TargetIp,
    /// `@`, expanded to the zone name when applied.
    Apex,
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TemplateRecord {
    record_type: DnsRecordType,
    name: &'static str,
    content: Content,
    priority: Option<u16>,
    proxied: bool,
}

const fn proxied(record_type: DnsRecordType, name: &'static str, content: Content) -> TemplateRecord {
    TemplateRecord {
        record_type,
        name,
        content,
        priority: None,
        proxied: true,
    }
}

const fn mx(content: &'static str, priority: u16) -> TemplateRecord {
    TemplateRecord {
        record_type: DnsRecordType::Mx,
        name: "@",
        content: Content::Literal(content),
        priority: Some(priority),
        proxied: false,
    }
}

/// A named set of records applied together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DnsTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    records: &'static [TemplateRecord],
}

const TEMPLATES: &[DnsTemplate] = &[
    DnsTemplate {
        id: "landing-page",
        name: "Landing Page",
        description: "Basic landing page with www",
        records: &[
            proxied(DnsRecordType::A, "@", Content::TargetIp),
            proxied(DnsRecordType::Cname, "www", Content::Apex),
        ],
    },
    DnsTemplate {
        id: "email-google",
        name: "Google Workspace Email",
        description: "MX + SPF records for Gmail",
        records: &[
            mx("aspmx.l.google.com", 1),
            mx("alt1.aspmx.l.google.com", 5),
            mx("alt2.aspmx.l.google.com", 5),
            mx("alt3.aspmx.l.google.com", 10),
            mx("alt4.aspmx.l.google.com", 10),
            TemplateRecord {
                record_type: DnsRecordType::Txt,
                name: "@",
                content: Content::Literal("v=spf1 include:_spf.google.com ~all"),
                priority: None,
                proxied: false,
            },
        ],
    },
    DnsTemplate {
        id: "wordpress",
        name: "WordPress",
        description: "A record + www + admin subdomain",
        records: &[
            proxied(DnsRecordType::A, "@", Content::TargetIp),
            proxied(DnsRecordType::Cname, "www", Content::Apex),
            proxied(DnsRecordType::Cname, "wp-admin", Content::Apex),
        ],
    },
    DnsTemplate {
        id: "saas",
        name: "SaaS Application",
        description: "App + API + www subdomains",
        records: &[
            proxied(DnsRecordType::A, "@", Content::TargetIp),
            proxied(DnsRecordType::Cname, "www", Content::Apex),
            proxied(DnsRecordType::Cname, "app", Content::Apex),
            proxied(DnsRecordType::Cname, "api", Content::Apex),
            proxied(DnsRecordType::Cname, "dashboard", Content::Apex),
        ],
    },
    DnsTemplate {
        id: "cdn-static",
        name: "CDN + Static Assets",
        description: "Static assets via CDN",
        records: &[
            proxied(DnsRecordType::A, "@", Content::TargetIp),
            proxied(DnsRecordType::Cname, "www", Content::Apex),
            proxied(DnsRecordType::Cname, "cdn", Content::Literal("cdn.example.com")),
            proxied(DnsRecordType::Cname, "static", Content::Literal("cdn.example.com")),
            proxied(DnsRecordType::Cname, "assets", Content::Literal("cdn.example.com")),
        ],
    },
];

/// Every built-in template.
pub fn templates() -> &'static [DnsTemplate] {
    TEMPLATES
}

pub fn find_template(id: &str) -> CoreResult<&'static DnsTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| CoreError::ValidationError(format!("Unknown DNS template: {id}")))
}

impl DnsTemplate {
    /// The template's records. CNAME targets may still be `@`; the record service
    /// expands them to the zone name.
    pub fn records(&self, target_ip: Option<Ipv4Addr>) -> Vec<DnsRecordInput> {
        let ip = target_ip.unwrap_or(DEFAULT_TARGET_IP).to_string();
        self.records
            .iter()
            .map(|r| {
                let content = match r.content {
                    Content::TargetIp => ip.clone(),
                    Content::Apex => "@".to_string(),
                    Content::Literal(s) => s.to_string(),
                };
                let mut input = DnsRecordInput::new(r.record_type, r.name, content)
                    .with_ttl(TEMPLATE_TTL)
                    .with_proxied(r.proxied);
                input.priority = r.priority;
                input
            })
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn landing_page_uses_default_ip() {
        let records = find_template("landing-page").unwrap().records(None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, DnsRecordType::A);
        assert_eq!(records[0].content, "192.0.2.1");
        assert_eq!(records[1].content, "@");
    }

    #[test]
    fn target_ip_is_substituted() {
        let records = find_template("saas")
            .unwrap()
            .records(Some(Ipv4Addr::new(203, 0, 113, 9)));
        assert_eq!(records[0].content, "203.0.113.9");
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn google_mail_records_carry_priorities() {
        let records = find_template("EMAIL-GOOGLE").unwrap().records(None);
        let priorities: Vec<_> = records.iter().filter_map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 5, 5, 10, 10]);
        assert!(records.iter().all(|r| r.proxied == Some(false)));
    }

    #[test]
    fn unknown_template_is_validation_error() {
        assert!(matches!(
            find_template("mailgun"),
            Err(CoreError::ValidationError(_))
        ));
        assert_eq!(templates().len(), 5);
    }
}
