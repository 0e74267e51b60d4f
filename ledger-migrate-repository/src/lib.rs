//! # Ledger Migrate Repository
//! Storage seams of the migration pipeline: the read-only legacy source and
//! the new document store. Each seam is a trait with a PostgreSQL
//! implementation and an in-memory implementation for tests and local runs.
//!
//! Rows coming out of the legacy store are validated here, at the boundary,
//! into the explicit record types of `ledger-migrate-shared` (see [`raw`]).
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod raw;

pub use errors::{SourceError, StoreError};
pub use interfaces::{DocumentStore, LegacySource, SharedCategory};
pub use memory::{MemoryDocumentStore, MemoryLegacySource};
pub use postgres::{PostgresDocumentStore, PostgresLegacySource};
