//! # Ledger Migrate
//! Entry points of the ledger migration: configuration from the environment,
//! tracing setup and the wiring of PostgreSQL stores into the pipeline.
pub mod config;
pub mod errors;
pub mod telemetry;

pub use config::{
    ConfigError, Dependencies, LogFormat, LogSettings, MigrationConfig, StoreSettings,
};
pub use errors::AppError;
pub use telemetry::init_tracing;
