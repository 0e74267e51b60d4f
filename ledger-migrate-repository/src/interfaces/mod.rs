//! This module defines and re-exports the interfaces of the migration repository.
//! It serves as a central point for accessing the storage traits.
mod document_store;
mod legacy_source;

pub use document_store::{DocumentStore, SharedCategory};
pub use legacy_source::LegacySource;
