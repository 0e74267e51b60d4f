//! This module defines the `LegacySource` trait, the read-only query surface of
//! the legacy store.
use async_trait::async_trait;
use ledger_migrate_shared::{
    LegacyAccount, LegacyCategory, LegacySheet, LegacyTransaction, PageWindow, SourceRow,
};

use crate::errors::SourceError;

/// Paginated, read-only access to the legacy store.
///
/// Every read returns the rows inside `window` in a stable order. A page
/// shorter than `window.limit` (possibly empty) means the table is exhausted.
/// Rows that fail validation come back as `Err(MalformedRecord)` items; only
/// failures of the read itself are reported as `SourceError`.
#[async_trait]
pub trait LegacySource: Send + Sync {
    async fn read_accounts(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyAccount>>, SourceError>;

    async fn read_categories(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyCategory>>, SourceError>;

    async fn read_sheets(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacySheet>>, SourceError>;

    async fn read_transactions(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyTransaction>>, SourceError>;

    /// Releases the connection. Called once, at teardown.
    async fn close(&self);
}
