//! `quick` command

use clap::Args;
use serde_json::Value;

use deploy_orchestrator_core::services::QuickActionOutcome;
use deploy_orchestrator_core::types::{QuickAction, WorkflowData, WorkflowState};

use super::check::verdict_lines;
use super::deploy_result_lines;
use crate::output::mark;
use crate::CommandContext;

#[derive(Debug, Args)]
pub struct QuickArgs {
    /// deploy-dns, dns-only, test-dns or quick-setup
    pub action: QuickAction,

    /// Wizard data as `key=value`, e.g. `--set domainId=landing --set target=cf-pages`
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_entry)]
    pub entries: Vec<(String, String)>,
}

pub(crate) async fn execute(args: QuickArgs, ctx: &CommandContext) -> anyhow::Result<bool> {
    let data: WorkflowData = args
        .entries
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let (action, data) = walk_wizard(args.action, data)?;

    let outcome = ctx
        .state
        .executor
        .execute(action, &data, &ctx.credentials)
        .await?;
    ctx.output.emit(&outcome, outcome_lines)?;
    Ok(outcome.success())
}

/// Step through every page of the wizard with the preset data.
fn walk_wizard(
    action: QuickAction,
    data: WorkflowData,
) -> anyhow::Result<(QuickAction, WorkflowData)> {
    let mut wizard = WorkflowState::new(action);
    wizard.merge(data);
    while !wizard.is_last_step() {
        let step = wizard.next()?;
        tracing::debug!("{action}: step {step}/{} ({})", wizard.total_steps(), wizard.step().title);
    }
    Ok(wizard.finish()?)
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn outcome_lines(outcome: &QuickActionOutcome) -> Vec<String> {
    match outcome {
        QuickActionOutcome::Deployed(result) => deploy_result_lines(result),
        QuickActionOutcome::DnsUpdated(upsert) => vec![format!(
            "{:?}: {} {} -> {}",
            upsert.action,
            upsert.record.record_type.as_str(),
            upsert.record.name,
            upsert.record.content
        )],
        QuickActionOutcome::Propagation(verdict) => verdict_lines(verdict),
        QuickActionOutcome::SetupCompleted {
            domain,
            registered,
            zone,
            nameserver_error,
            deploy,
        } => {
            let mut lines = vec![
                format!("{} {domain}", mark(deploy.success)),
                format!("  Registered now: {registered}"),
                format!("  Zone: {} ({:?})", zone.id, zone.status),
            ];
            if !zone.name_servers.is_empty() {
                lines.push(format!("  Nameservers: {}", zone.name_servers.join(", ")));
            }
            if let Some(error) = nameserver_error {
                lines.push(format!("  Nameserver update failed: {error}"));
            }
            lines.extend(deploy_result_lines(deploy));
            lines
        }
    }
}
