//! `history` commands

use clap::Subcommand;
use serde_json::json;

use deploy_orchestrator_core::types::{
    DeployStatus, DeploymentRecord, DeploymentStats, DeploymentTarget, HistoryFilter,
};

use crate::output::or_dash;
use crate::CommandContext;

/// History subcommands
#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    /// List recorded deployments, newest first
    List {
        /// Only this target
        #[arg(short, long)]
        target: Option<DeploymentTarget>,

        /// Only successful or only failed deployments
        #[arg(short, long, value_parser = parse_status)]
        status: Option<DeployStatus>,

        /// Only this domain
        #[arg(short, long)]
        domain: Option<String>,

        /// At most this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Aggregate statistics over the retained history
    Stats,

    /// Delete every record
    Clear,
}

pub(crate) async fn execute(command: HistoryCommands, ctx: &CommandContext) -> anyhow::Result<bool> {
    let history = &ctx.state.history_service;
    match command {
        HistoryCommands::List {
            target,
            status,
            domain,
            limit,
        } => {
            let filter = HistoryFilter {
                target,
                status,
                domain,
                limit,
            };
            let records = history.list(&filter).await;
            ctx.output.emit(&records, |records| {
                records.iter().map(record_line).collect()
            })?;
        }
        HistoryCommands::Stats => {
            let stats = history.stats().await;
            ctx.output.emit(&stats, stats_lines)?;
        }
        HistoryCommands::Clear => {
            history.clear().await?;
            ctx.output.emit(&json!({ "cleared": true }), |_| {
                vec!["Deployment history cleared".to_string()]
            })?;
        }
    }
    Ok(true)
}

fn parse_status(value: &str) -> Result<DeployStatus, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "success" => Ok(DeployStatus::Success),
        "failed" => Ok(DeployStatus::Failed),
        other => Err(format!("expected 'success' or 'failed', got '{other}'")),
    }
}

fn record_line(record: &DeploymentRecord) -> String {
    format!(
        "{}  {:<8} {:<14} {:<24} {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.status.to_string(),
        record.target.slug(),
        record.domain,
        or_dash(record.url.as_deref().or(record.error.as_deref()))
    )
}

fn stats_lines(stats: &DeploymentStats) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Total: {} ({} succeeded, {} failed, {:.1}% success)",
            stats.total, stats.success_count, stats.failed_count, stats.success_rate
        ),
        format!("Average duration: {} ms", stats.avg_duration_ms),
        format!("Last 24h: {}  Last 7 days: {}", stats.last_24h, stats.last_week),
    ];
    for (target, count) in &stats.by_target {
        lines.push(format!("  {:<14} {count}", target.slug()));
    }
    lines
}
