//! Mock legacy source for testing and local development.
//!
//! # Example
//!
//! ```ignore
//! use ledger_migrate_repository::MemoryLegacySource;
//! use ledger_migrate_repository::raw::RawAccount;
//!
//! let source = MemoryLegacySource::new()
//!     .with_accounts(vec![RawAccount { id: "u1".into(), ..Default::default() }]);
//! let page = source.read_accounts(PageWindow::first(100)).await?;
//! ```
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use ledger_migrate_shared::{
    EntityKind, LegacyAccount, LegacyCategory, LegacySheet, LegacyTransaction, PageWindow,
    SourceRow,
};

use super::{read, write};
use crate::errors::SourceError;
use crate::raw::{RawAccount, RawCategory, RawSheet, RawTransaction};
use crate::LegacySource;

/// Legacy source backed by vectors of raw rows, served in insertion order.
#[derive(Default)]
pub struct MemoryLegacySource {
    accounts: Vec<RawAccount>,
    categories: Vec<RawCategory>,
    sheets: Vec<RawSheet>,
    transactions: Vec<RawTransaction>,
    failing: RwLock<HashSet<EntityKind>>,
    reads: RwLock<Vec<(EntityKind, PageWindow)>>,
    closed: AtomicBool,
}

impl MemoryLegacySource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(mut self, accounts: Vec<RawAccount>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_categories(mut self, categories: Vec<RawCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_sheets(mut self, sheets: Vec<RawSheet>) -> Self {
        self.sheets = sheets;
        self
    }

    pub fn with_transactions(mut self, transactions: Vec<RawTransaction>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Make every read of `kind` fail, as if the legacy store went away.
    pub fn fail_reads_for(&self, kind: EntityKind) {
        write(&self.failing).insert(kind);
    }

    /// Every read issued so far, in order.
    pub fn reads(&self) -> Vec<(EntityKind, PageWindow)> {
        read(&self.reads).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Accept calls again after `close`, like a fresh connection to the same data.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn page<T, R>(
        &self,
        kind: EntityKind,
        rows: &[T],
        window: PageWindow,
        validate: impl Fn(T) -> SourceRow<R>,
    ) -> Result<Vec<SourceRow<R>>, SourceError>
    where
        T: Clone,
    {
        write(&self.reads).push((kind, window));

        if self.is_closed() {
            return Err(SourceError::Unavailable {
                kind,
                message: "source is closed".to_string(),
            });
        }
        if read(&self.failing).contains(&kind) {
            return Err(SourceError::Unavailable {
                kind,
                message: "connection refused".to_string(),
            });
        }

        Ok(rows
            .iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .map(validate)
            .collect())
    }
}

#[async_trait]
impl LegacySource for MemoryLegacySource {
    async fn read_accounts(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyAccount>>, SourceError> {
        self.page(EntityKind::Account, &self.accounts, window, RawAccount::validate)
    }

    async fn read_categories(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyCategory>>, SourceError> {
        self.page(EntityKind::Category, &self.categories, window, RawCategory::validate)
    }

    async fn read_sheets(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacySheet>>, SourceError> {
        self.page(EntityKind::Sheet, &self.sheets, window, RawSheet::validate)
    }

    async fn read_transactions(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyTransaction>>, SourceError> {
        self.page(
            EntityKind::Transaction,
            &self.transactions,
            window,
            RawTransaction::validate,
        )
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(id: &str) -> RawAccount {
        RawAccount {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
            created_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pages_follow_insertion_order() {
        let source = MemoryLegacySource::new()
            .with_accounts(vec![account("u1"), account("u2"), account("u3")]);

        let first = source.read_accounts(PageWindow::first(2)).await.unwrap();
        let second = source
            .read_accounts(PageWindow::first(2).next())
            .await
            .unwrap();

        let ids: Vec<_> = first
            .iter()
            .chain(second.iter())
            .map(|row| row.as_ref().unwrap().legacy_id.clone())
            .collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
        assert_eq!(source.reads().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_kind_returns_error() {
        let source = MemoryLegacySource::new().with_accounts(vec![account("u1")]);
        source.fail_reads_for(EntityKind::Account);

        let err = source
            .read_accounts(PageWindow::first(10))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { kind: EntityKind::Account, .. }));
    }
}
