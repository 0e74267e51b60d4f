//! This module defines the `DocumentStore` trait, the write surface of the new
//! store the pipeline migrates into.
use async_trait::async_trait;
use ledger_migrate_shared::{
    EntityKind, LegacyId, NewAccount, NewCategory, NewId, NewSheet, NewTransaction,
};

use crate::errors::StoreError;

/// A shared category, as found by [`DocumentStore::first_shared_category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedCategory {
    pub id: NewId,
    pub label: String,
}

/// A trait that defines the interface of the new document store.
///
/// Every migrated document carries the primary key it had in the legacy store
/// (`legacy_id`), and the store enforces uniqueness on it. That marker is
/// what makes re-running the pipeline safe.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every `(legacy_id, id)` pair already present for `kind`.
    ///
    /// Used to seed the identity map at the start of a stage.
    async fn legacy_identities(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(LegacyId, NewId)>, StoreError>;

    /// Looks up a migrated document by its legacy identifier.
    async fn find_by_legacy_id(
        &self,
        kind: EntityKind,
        legacy_id: &str,
    ) -> Result<Option<NewId>, StoreError>;

    async fn create_account(&self, account: &NewAccount) -> Result<NewId, StoreError>;

    async fn create_category(&self, category: &NewCategory) -> Result<NewId, StoreError>;

    async fn create_sheet(&self, sheet: &NewSheet) -> Result<NewId, StoreError>;

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<NewId, StoreError>;

    /// The oldest category without an owner, if any.
    async fn first_shared_category(&self) -> Result<Option<SharedCategory>, StoreError>;

    /// Points every transaction without a category at `category_id`.
    ///
    /// Returns the number of transactions updated.
    async fn assign_missing_categories(&self, category_id: NewId) -> Result<u64, StoreError>;

    /// Releases the connection. Called once, at teardown.
    async fn close(&self);
}
