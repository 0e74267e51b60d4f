mod account;
mod category;
mod entity_kind;
mod page;
mod sheet;
mod source_row;
mod transaction;

pub use account::{LegacyAccount, NewAccount};
pub use category::{LegacyCategory, NewCategory};
pub use entity_kind::EntityKind;
pub use page::PageWindow;
pub use sheet::{LegacySheet, NewSheet};
pub use source_row::{MalformedRecord, SourceRow};
pub use transaction::{LegacyTransaction, NewTransaction, TransactionKind, UnknownTransactionKind};

/// Primary key of a record in the legacy store.
pub type LegacyId = String;

/// Primary key assigned by the new store on creation.
pub type NewId = uuid::Uuid;
