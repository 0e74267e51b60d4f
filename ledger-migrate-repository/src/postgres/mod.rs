//! PostgreSQL implementations of the migration repository.
//!
//! The legacy store is the Supabase Postgres instance the application used to
//! run on; the new store is the application's own Postgres database, whose
//! schema lives in this crate's `migrations/` directory.
mod connection;
mod document_store;
mod legacy_source;

pub use connection::{connect, PoolSettings};
pub use document_store::PostgresDocumentStore;
pub use legacy_source::PostgresLegacySource;
