//! Single DoH JSON query.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsQueryType, DohResolver};

/// NOERROR
const STATUS_NOERROR: u32 = 0;
/// NXDOMAIN: the name does not exist (yet)
const STATUS_NXDOMAIN: u32 = 3;

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

fn status_name(status: u32) -> &'static str {
    match status {
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        _ => "error",
    }
}

/// Answers of the requested type, normalized, in resolver order.
///
/// When the resolver returned only records of other types (a CNAME chain without
/// the final hop), the first answer is used as is.
fn extract_answers(response: DohResponse, record_type: DnsQueryType) -> Vec<String> {
    let typed: Vec<String> = response
        .answer
        .iter()
        .filter(|a| a.record_type == record_type.code())
        .map(|a| record_type.normalize_answer(&a.data))
        .collect();
    if !typed.is_empty() {
        return typed;
    }
    response
        .answer
        .first()
        .map(|a| vec![record_type.normalize_answer(&a.data)])
        .unwrap_or_default()
}

/// Ask one resolver; NOERROR yields the normalized answers (possibly empty).
///
/// NXDOMAIN is an answer, not a resolver fault, and yields no values.
pub(crate) async fn query(
    client: &Client,
    resolver: &DohResolver,
    hostname: &str,
    record_type: DnsQueryType,
) -> ToolboxResult<Vec<String>> {
    log::debug!("[doh] {} {hostname} {record_type}", resolver.name);
    let type_name = record_type.to_string();
    let response = client
        .get(&resolver.url)
        .query(&[("name", hostname), ("type", type_name.as_str())])
        .header("Accept", "application/dns-json")
        .send()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("{}: {e}", resolver.name)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolboxError::NetworkError(format!(
            "{}: HTTP {}",
            resolver.name,
            status.as_u16()
        )));
    }

    let body: DohResponse = response
        .json()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("{}: invalid response: {e}", resolver.name)))?;

    if body.status == STATUS_NXDOMAIN {
        log::debug!("[doh] {}: {hostname} does not exist", resolver.name);
        return Ok(Vec::new());
    }
    if body.status != STATUS_NOERROR {
        return Err(ToolboxError::NetworkError(format!(
            "{}: DNS status {} ({})",
            resolver.name,
            body.status,
            status_name(body.status)
        )));
    }

    Ok(extract_answers(body, record_type))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DohResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn prefers_answers_of_requested_type() {
        let response = parse(
            r#"{"Status":0,"Answer":[
                {"name":"www.example.com.","type":5,"TTL":300,"data":"example.com."},
                {"name":"example.com.","type":1,"TTL":300,"data":"192.0.2.1"}
            ]}"#,
        );
        assert_eq!(extract_answers(response, DnsQueryType::A), vec!["192.0.2.1"]);
    }

    #[test]
    fn falls_back_to_first_answer() {
        let response = parse(
            r#"{"Status":0,"Answer":[{"name":"www.example.com.","type":5,"TTL":300,"data":"target.example.net."}]}"#,
        );
        assert_eq!(
            extract_answers(response, DnsQueryType::A),
            vec!["target.example.net."]
        );
    }

    #[test]
    fn missing_answer_section_is_empty() {
        let response = parse(r#"{"Status":0}"#);
        assert!(extract_answers(response, DnsQueryType::Txt).is_empty());
    }

    #[test]
    fn nxdomain_name() {
        assert_eq!(status_name(3), "NXDOMAIN");
        assert_eq!(status_name(42), "error");
    }
}
