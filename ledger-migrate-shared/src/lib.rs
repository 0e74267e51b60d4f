//! # Ledger Migrate Shared
//! This crate defines the record and document types shared across the ledger
//! migration workspace: validated legacy records as read from the source
//! store, the documents written to the new store, and the small value types
//! (entity kinds, page windows, transaction kinds) that tie them together.
pub mod types;

pub use types::{
    EntityKind, LegacyAccount, LegacyCategory, LegacyId, LegacySheet, LegacyTransaction,
    MalformedRecord, NewAccount, NewCategory, NewId, NewSheet, NewTransaction, PageWindow,
    SourceRow, TransactionKind, UnknownTransactionKind,
};
