//! Error types for the migration binaries.
use ledger_migrate_repository::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while starting up, before the pipeline runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Tracing error: {0}")]
    Tracing(String),
}
