//! Error types for the migration pipeline.
//!
//! Only stage-fatal conditions are errors here. Problems with a single record
//! are logged to the run log and the record is skipped.
use ledger_migrate_repository::{SourceError, StoreError};
use ledger_migrate_shared::{EntityKind, LegacyId};
use thiserror::Error;

/// Represents errors that abort the pipeline.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unresolved reference on {} {legacy_id}: {reason}", .kind.singular())]
    UnresolvedReference {
        kind: EntityKind,
        legacy_id: LegacyId,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid unresolved reference policy {0:?}, expected drop, park or fail")]
pub struct InvalidPolicy(pub String);
