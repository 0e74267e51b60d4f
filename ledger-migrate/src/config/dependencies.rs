//! Dependency initialization and wiring for the migration binaries.
use std::sync::Arc;

use ledger_migrate_pipeline::Orchestrator;
use ledger_migrate_repository::postgres::{connect, PostgresDocumentStore, PostgresLegacySource};
use tracing::info;

use super::settings::{MigrationConfig, StoreSettings};
use crate::errors::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connects to both databases, brings the new store schema up to date and
    /// builds the orchestrator.
    pub async fn new(config: &MigrationConfig) -> Result<Self, AppError> {
        info!(
            batch_size = config.batch_size.get(),
            max_connections = config.store.max_connections,
            policy = %config.policy,
            "Initializing dependencies"
        );

        info!("Connecting to the legacy database...");
        let legacy_pool = connect(&config.legacy_database_url, config.legacy_pool()).await?;
        let source = Arc::new(PostgresLegacySource::new(legacy_pool));
        info!("Connected to the legacy database");

        let store = connect_store(&config.store).await?;

        let orchestrator = Orchestrator::new(source, store, config.orchestrator());
        Ok(Self { orchestrator })
    }
}

/// Connects to the new store and applies pending schema migrations.
pub async fn connect_store(settings: &StoreSettings) -> Result<Arc<PostgresDocumentStore>, AppError> {
    info!("Connecting to the new store...");
    let pool = connect(&settings.database_url, settings.pool()).await?;
    let store = PostgresDocumentStore::new(pool);
    store.migrate().await?;
    info!("Connected to the new store, schema is up to date");
    Ok(Arc::new(store))
}
