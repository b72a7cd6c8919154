//! Subcommand implementations

pub mod check;
pub mod deploy;
pub mod dns;
pub mod history;
pub mod quick;

use deploy_orchestrator_core::types::{DeployResult, DeploymentTarget};

use crate::output::{mark, or_dash};

/// Text lines shared by `deploy` and `quick`.
pub(crate) fn deploy_result_lines(result: &DeployResult) -> Vec<String> {
    let target = result.target.map_or("-", DeploymentTarget::slug);
    let mut lines = vec![format!(
        "{} {} ({} ms)",
        mark(result.success),
        target,
        result.duration_ms
    )];
    if let Some(url) = &result.url {
        lines.push(format!("  URL: {url}"));
    }
    if let Some(id) = &result.deployment_id {
        lines.push(format!("  Deployment: {id}"));
    }
    if let Some(error) = &result.error {
        lines.push(format!("  Error: {error}"));
    }
    if let Some(updated) = result.dns_updated {
        lines.push(format!(
            "  DNS: {} {}",
            mark(updated),
            or_dash(result.dns_error.as_deref())
        ));
    }
    lines
}
