//! Configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `LEGACY_DATABASE_URL`: legacy PostgreSQL database (required)
//! - `DATABASE_URL`: new store PostgreSQL database (required)
//! - `BATCH_SIZE`: rows fetched per page (default: 100)
//! - `PG_MAX_CONNECTIONS`: pool size for each database (default: 5)
//! - `MIGRATION_LOG_DIR`: run log directory, `-` disables the file (default: logs)
//! - `UNRESOLVED_REFERENCE_POLICY`: drop, park or fail (default: drop)
//! - `LOG_FORMAT`: pretty or json (default: pretty)
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::str::FromStr;

use ledger_migrate_pipeline::{OrchestratorConfig, RunLog, UnresolvedPolicy};
use ledger_migrate_repository::postgres::PoolSettings;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: u64 = 100;
pub const PG_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Value of `MIGRATION_LOG_DIR` that turns the run log file off.
const LOG_DIR_DISABLED: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "console" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err("expected pretty or json".to_string()),
        }
    }
}

/// Connection settings of the new store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub database_url: String,
    pub max_connections: u32,
}

impl StoreSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            max_connections: max_connections(&lookup)?,
        })
    }

    pub fn pool(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            ..Default::default()
        }
    }
}

/// Where and how the run is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Directory of the run log file; `None` keeps the run log in memory.
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let dir = match lookup("MIGRATION_LOG_DIR") {
            Some(dir) if dir.trim() == LOG_DIR_DISABLED => None,
            Some(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir.trim())),
            _ => Some(PathBuf::from(DEFAULT_LOG_DIR)),
        };
        let format = parsed(&lookup, "LOG_FORMAT", LogFormat::default())?;
        Ok(Self { dir, format })
    }

    /// Opens the run log for a run named `prefix`.
    pub fn run_log(&self, prefix: &str) -> RunLog {
        match &self.dir {
            Some(dir) => RunLog::with_file(dir, prefix),
            None => RunLog::new(),
        }
    }
}

/// Everything the migration binary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub legacy_database_url: String,
    pub store: StoreSettings,
    pub batch_size: NonZeroU64,
    pub policy: UnresolvedPolicy,
    pub log: LogSettings,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let batch_size = batch_size(&lookup)?;

        Ok(Self {
            legacy_database_url: required(&lookup, "LEGACY_DATABASE_URL")?,
            store: StoreSettings::from_lookup(&lookup)?,
            batch_size,
            policy: parsed(&lookup, "UNRESOLVED_REFERENCE_POLICY", UnresolvedPolicy::default())?,
            log: LogSettings::from_lookup(&lookup)?,
        })
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            page_size: self.batch_size,
            policy: self.policy,
        }
    }

    pub fn legacy_pool(&self) -> PoolSettings {
        self.store.pool()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

/// Page size; the legacy reader binds it as a Postgres `BIGINT`.
fn batch_size(lookup: &impl Fn(&str) -> Option<String>) -> Result<NonZeroU64, ConfigError> {
    let size = parsed(lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "BATCH_SIZE",
        value: size.to_string(),
        reason: reason.to_string(),
    };
    if size > i64::MAX as u64 {
        return Err(invalid("must not exceed 9223372036854775807"));
    }
    NonZeroU64::new(size).ok_or_else(|| invalid("must be a positive integer"))
}

fn max_connections(lookup: &impl Fn(&str) -> Option<String>) -> Result<u32, ConfigError> {
    let max = parsed(lookup, "PG_MAX_CONNECTIONS", PG_MAX_CONNECTIONS)?;
    if max == 0 {
        return Err(ConfigError::Invalid {
            key: "PG_MAX_CONNECTIONS",
            value: max.to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(max)
}
