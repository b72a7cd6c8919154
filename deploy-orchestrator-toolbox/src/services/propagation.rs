//! DNS propagation check module.

use std::time::Instant;

use futures::future::join_all;
use reqwest::Client;
use tokio::time::{timeout, Duration};

use crate::types::{DnsQueryType, DohResolver, PropagationCheckResult, PropagationVerdict};

use super::doh;

/// Query every resolver concurrently, each under its own timeout.
pub(crate) async fn check_propagation(
    client: &Client,
    resolvers: &[DohResolver],
    query_timeout: Duration,
    hostname: &str,
    record_type: DnsQueryType,
    expected: Option<&str>,
) -> PropagationVerdict {
    let start_time = Instant::now();
    let expected = expected.map(|e| record_type.normalize_answer(e));

    let futures: Vec<_> = resolvers
        .iter()
        .map(|resolver| {
            let expected = expected.as_deref();
            async move {
                let query_start = Instant::now();
                let result = timeout(
                    query_timeout,
                    doh::query(client, resolver, hostname, record_type),
                )
                .await;
                // u128 -> u64: a single query is bounded by the timeout
                #[allow(clippy::cast_possible_truncation)]
                let elapsed = query_start.elapsed().as_millis() as u64;

                match result {
                    Ok(Ok(answers)) => {
                        let observed = answers.into_iter().next();
                        let matches = match (expected, observed.as_deref()) {
                            (Some(expected), Some(observed)) => observed == expected,
                            (None, Some(observed)) => !observed.is_empty(),
                            (_, None) => false,
                        };
                        PropagationCheckResult {
                            server: resolver.name.clone(),
                            success: true,
                            observed_value: observed,
                            matches,
                            error: None,
                            response_time_ms: elapsed,
                        }
                    }
                    Ok(Err(e)) => {
                        log::warn!("[doh] {} failed for {hostname}: {e}", resolver.name);
                        PropagationCheckResult {
                            server: resolver.name.clone(),
                            success: false,
                            observed_value: None,
                            matches: false,
                            error: Some(e.to_string()),
                            response_time_ms: elapsed,
                        }
                    }
                    Err(_) => {
                        log::warn!("[doh] {} timed out for {hostname}", resolver.name);
                        PropagationCheckResult {
                            server: resolver.name.clone(),
                            success: false,
                            observed_value: None,
                            matches: false,
                            error: Some(format!(
                                "Query timeout ({}ms)",
                                query_timeout.as_millis()
                            )),
                            response_time_ms: elapsed,
                        }
                    }
                }
            }
        })
        .collect();

    let per_server = join_all(futures).await;
    let propagated = !per_server.is_empty() && per_server.iter().all(|r| r.success && r.matches);

    // u128 -> u64: bounded by the per-query timeout
    #[allow(clippy::cast_possible_truncation)]
    let total_time_ms = start_time.elapsed().as_millis() as u64;

    PropagationVerdict {
        hostname: hostname.to_string(),
        record_type,
        expected,
        propagated,
        per_server,
        total_time_ms,
    }
}
