use ledger_migrate_shared::EntityKind;
use thiserror::Error;

/// Represents errors that can occur while reading from or writing to the new store.
///
/// Errors split into two groups. Record-level failures (conflicts, constraint
/// violations, undecodable values) only concern the document being written.
/// Connectivity failures mean the store itself is gone; see [`StoreError::is_fatal`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("A {} with legacy id {legacy_id} already exists", .kind.singular())]
    Conflict { kind: EntityKind, legacy_id: String },

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error means the store can no longer be used for this run.
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::Conflict { .. } | StoreError::Constraint(_) => false,
            StoreError::Unavailable(_) | StoreError::MigrateError(_) => true,
            StoreError::DatabaseError(sqlx::Error::Database(db)) => {
                !db.code().is_some_and(|code| is_record_level_sqlstate(&code))
            }
            StoreError::DatabaseError(e) => !matches!(
                e,
                sqlx::Error::RowNotFound
                    | sqlx::Error::TypeNotFound { .. }
                    | sqlx::Error::ColumnNotFound(_)
                    | sqlx::Error::ColumnIndexOutOfBounds { .. }
                    | sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::Encode(_)
                    | sqlx::Error::Decode(_)
            ),
        }
    }
}

/// SQLSTATE classes 22 (data exception) and 23 (integrity constraint
/// violation) are caused by the row being written. Everything else, such as
/// 08 connection exceptions, 53 insufficient resources, 57 operator
/// intervention or 25006 read-only transaction, affects every later write.
fn is_record_level_sqlstate(code: &str) -> bool {
    code.starts_with("22") || code.starts_with("23")
}
