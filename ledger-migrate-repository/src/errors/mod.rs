//! Error types for the ledger migration repository.
//! Consolidates and re-exports the errors of the legacy source and the new store.
mod source;
mod store;

pub use source::SourceError;
pub use store::StoreError;
