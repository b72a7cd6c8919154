//! `check` command

use std::time::Duration;

use clap::Args;

use deploy_orchestrator_core::types::PropagationVerdict;
use deploy_orchestrator_toolbox::DnsQueryType;

use crate::output::{mark, or_dash};
use crate::CommandContext;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Hostname to look up
    pub hostname: String,

    /// Record type
    #[arg(short = 't', long = "type", default_value = "A")]
    pub record_type: DnsQueryType,

    /// Value every resolver should return
    #[arg(short, long)]
    pub expected: Option<String>,

    /// Re-check until propagated
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds between checks with `--wait`
    #[arg(long, default_value_t = 10)]
    pub interval: u64,

    /// Checks before giving up with `--wait`
    #[arg(long, default_value_t = 30)]
    pub attempts: u32,
}

pub(crate) async fn execute(args: CheckArgs, ctx: &CommandContext) -> anyhow::Result<bool> {
    let expected = args.expected.as_deref();
    let verdict = if args.wait {
        ctx.config
            .propagation_checker()
            .poll_until_propagated(
                &args.hostname,
                args.record_type,
                expected,
                Duration::from_secs(args.interval.max(1)),
                args.attempts,
            )
            .await?
    } else {
        ctx.state
            .ctx
            .propagation
            .verify(&args.hostname, args.record_type, expected)
            .await?
    };

    ctx.output.emit(&verdict, verdict_lines)?;
    Ok(verdict.propagated)
}

pub(crate) fn verdict_lines(verdict: &PropagationVerdict) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}: {}/{} resolvers agree ({} ms)",
        mark(verdict.propagated),
        verdict.hostname,
        verdict.record_type,
        verdict.matching_count(),
        verdict.per_server.len(),
        verdict.total_time_ms
    )];
    for server in &verdict.per_server {
        let observed = server
            .error
            .as_deref()
            .or(server.observed_value.as_deref());
        lines.push(format!(
            "  {} {:<12} {} ({} ms)",
            mark(server.success && server.matches),
            server.server,
            or_dash(observed),
            server.response_time_ms
        ));
    }
    lines
}
