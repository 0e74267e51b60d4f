//! Assigns the first shared category to every migrated transaction that has
//! no category.
//!
//! Transactions whose legacy category did not migrate are written without
//! one; run this after `ledger-migrate` to give them a default.

use std::process::ExitCode;

use anyhow::{Context, Result};
use dotenv::dotenv;
use ledger_migrate::config::connect_store;
use ledger_migrate::{init_tracing, LogSettings, StoreSettings};
use ledger_migrate_pipeline::{BackfillOutcome, CategoryBackfill};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Category fix failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let store_settings = StoreSettings::from_env().context("Invalid configuration")?;
    let log_settings = LogSettings::from_env().context("Invalid configuration")?;
    init_tracing("fix-category-mapping", log_settings.format)?;

    let store = connect_store(&store_settings)
        .await
        .context("Failed to connect to the new store")?;

    let mut log = log_settings.run_log("fix-category-mapping");
    let backfill = CategoryBackfill::new(store);
    let result = backfill.run(&mut log).await;
    backfill.close().await;
    log.close();

    match result.context("Failed to assign categories")? {
        BackfillOutcome::Updated { transactions, .. } => {
            info!(transactions, "Category mapping fixed");
            Ok(true)
        }
        BackfillOutcome::NoSharedCategory => Ok(false),
    }
}
