use ledger_migrate_shared::EntityKind;
use thiserror::Error;

/// Represents errors that can occur while reading the legacy store.
///
/// Any of these aborts the stage that issued the read: a page that cannot be
/// fetched leaves the pipeline with no way to know what it skipped.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Failed to read {kind}: {message}")]
    Unavailable { kind: EntityKind, message: String },
}
