//! Ledger Migrate Main Entry Point
//!
//! Moves accounts, categories, sheets and transactions from the legacy
//! database into the new store. Safe to re-run: documents migrated by an
//! earlier run are skipped.

use std::process::ExitCode;

use anyhow::{Context, Result};
use dotenv::dotenv;
use ledger_migrate::{init_tracing, Dependencies, MigrationConfig};
use ledger_migrate_pipeline::RunOutcome;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv().ok();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Migration could not start");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let config = MigrationConfig::from_env().context("Invalid configuration")?;
    init_tracing("ledger-migrate", config.log.format)?;

    info!("Starting ledger migration");

    let deps = Dependencies::new(&config)
        .await
        .context("Failed to initialize dependencies")?;
    info!("Dependencies initialized successfully");

    let mut log = config.log.run_log("migration");
    if let Some(path) = log.file_path() {
        info!(path = %path.display(), "Writing run log");
    }

    let outcome = deps.orchestrator.run(&mut log).await;
    log.close();

    match outcome {
        RunOutcome::Completed(_) => {
            info!("Ledger migration completed successfully");
            Ok(true)
        }
        RunOutcome::Aborted { stage, error, .. } => {
            error!(stage = %stage, error = %error, "Ledger migration aborted");
            Ok(false)
        }
    }
}
