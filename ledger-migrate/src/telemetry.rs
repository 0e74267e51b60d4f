//! Tracing setup shared by the binaries.
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::errors::AppError;

const DEFAULT_FILTER: &str =
    "ledger_migrate=info,ledger_migrate_pipeline=info,ledger_migrate_repository=info";

/// Initialize tracing/logging.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(service_name: &'static str, format: LogFormat) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
    }
    .map_err(|e| AppError::Tracing(e.to_string()))?;

    info!(
        service_name,
        service_version = env!("CARGO_PKG_VERSION"),
        format = ?format,
        "Tracing initialized"
    );
    Ok(())
}
