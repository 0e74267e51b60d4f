//! In-memory implementations of the migration repository.
//!
//! They behave like the PostgreSQL adapters where the pipeline can observe
//! the difference: stable page order, validation of legacy rows, uniqueness
//! of `legacy_id`, per-owner category labels and foreign keys. Failure
//! injection hooks let tests exercise the fatal and per-record error paths
//! without a database.
mod document_store;
mod legacy_source;

pub use document_store::MemoryDocumentStore;
pub use legacy_source::MemoryLegacySource;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
