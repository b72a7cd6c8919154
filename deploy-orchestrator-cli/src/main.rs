//! Deploy orchestrator CLI entry point

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match deploy_orchestrator_cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
