//! Deploy orchestrator CLI
//!
//! Terminal frontend over the application state:
//! - Deploy a configured site to a hosting target, then point its domain at it
//! - Manage DNS records, templates and zones
//! - Check DNS propagation across public resolvers
//! - Inspect and clear the deployment history
//! - Run the quick-action wizards non-interactively

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deploy_orchestrator_app::{AppState, OrchestratorConfig};
use deploy_orchestrator_core::types::CredentialSet;

mod commands;
mod output;

use commands::{check, deploy, dns, history, quick};
pub use output::OutputFormat;

/// Deploy orchestrator CLI application
#[derive(Debug, Parser)]
#[command(name = "deploy-orchestrator")]
#[command(about = "Deploy static sites and point their domains at them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "DEPLOY_ORCHESTRATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish a site to a hosting target
    Deploy(deploy::DeployArgs),

    /// Manage DNS records and zones
    Dns {
        #[command(subcommand)]
        command: dns::DnsCommands,
    },

    /// Check DNS propagation of a hostname
    Check(check::CheckArgs),

    /// Deployment history
    History {
        #[command(subcommand)]
        command: history::HistoryCommands,
    },

    /// Run a quick action with preset wizard data
    Quick(quick::QuickArgs),
}

/// Everything a command needs, built once per invocation.
pub(crate) struct CommandContext {
    pub config: OrchestratorConfig,
    pub credentials: CredentialSet,
    pub state: AppState,
    pub output: OutputFormat,
}

impl CommandContext {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config = OrchestratorConfig::load(cli.config.as_deref())
            .context("Failed to load configuration")?;
        let credentials = config.credentials()?;
        let state = AppState::from_config(&config)?;
        Ok(Self {
            config,
            credentials,
            state,
            output: cli.output,
        })
    }
}

/// Run using the current process arguments.
pub async fn run() -> anyhow::Result<ExitCode> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
///
/// `ExitCode::FAILURE` when the command ran but its outcome was a failure
/// (failed deployment, unpropagated record, incomplete template).
pub async fn run_with_args<I, T>(args: I) -> anyhow::Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.verbose);

    let ctx = CommandContext::load(&cli)?;
    let succeeded = match cli.command {
        Commands::Deploy(args) => deploy::execute(args, &ctx).await?,
        Commands::Dns { command } => dns::execute(command, &ctx).await?,
        Commands::Check(args) => check::execute(args, &ctx).await?,
        Commands::History { command } => history::execute(command, &ctx).await?,
        Commands::Quick(args) => quick::execute(args, &ctx).await?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .try_init();
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
