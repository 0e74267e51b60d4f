//! Mock document store for testing and local development.
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use ledger_migrate_shared::{
    EntityKind, LegacyId, NewAccount, NewCategory, NewId, NewSheet, NewTransaction,
};
use uuid::Uuid;

use super::{read, write};
use crate::errors::StoreError;
use crate::interfaces::{DocumentStore, SharedCategory};

#[derive(Default)]
struct State {
    accounts: Vec<(NewId, NewAccount)>,
    categories: Vec<(NewId, NewCategory)>,
    sheets: Vec<(NewId, NewSheet)>,
    transactions: Vec<(NewId, NewTransaction)>,
    writes: usize,
}

impl State {
    fn legacy_ids(&self, kind: EntityKind) -> Vec<(LegacyId, NewId)> {
        match kind {
            EntityKind::Account => pairs(&self.accounts, |a| &a.legacy_id),
            EntityKind::Category => pairs(&self.categories, |c| &c.legacy_id),
            EntityKind::Sheet => pairs(&self.sheets, |s| &s.legacy_id),
            EntityKind::Transaction => pairs(&self.transactions, |t| &t.legacy_id),
        }
    }

    fn has(&self, kind: EntityKind, id: NewId) -> bool {
        match kind {
            EntityKind::Account => self.accounts.iter().any(|(i, _)| *i == id),
            EntityKind::Category => self.categories.iter().any(|(i, _)| *i == id),
            EntityKind::Sheet => self.sheets.iter().any(|(i, _)| *i == id),
            EntityKind::Transaction => self.transactions.iter().any(|(i, _)| *i == id),
        }
    }

    fn ensure_new(&self, kind: EntityKind, legacy_id: &str) -> Result<(), StoreError> {
        if self.legacy_ids(kind).iter().any(|(l, _)| l == legacy_id) {
            return Err(StoreError::Conflict {
                kind,
                legacy_id: legacy_id.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_ref(&self, kind: EntityKind, id: NewId) -> Result<(), StoreError> {
        if !self.has(kind, id) {
            return Err(StoreError::Constraint(format!(
                "{} {id} does not exist",
                kind.singular()
            )));
        }
        Ok(())
    }
}

fn pairs<T>(docs: &[(NewId, T)], legacy_id: impl Fn(&T) -> &LegacyId) -> Vec<(LegacyId, NewId)> {
    docs.iter()
        .map(|(id, doc)| (legacy_id(doc).clone(), *id))
        .collect()
}

/// Document store kept entirely in memory.
///
/// Enforces the same uniqueness and reference rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: RwLock<State>,
    unavailable_after: Option<usize>,
    rejected: HashSet<LegacyId>,
    raced: HashSet<LegacyId>,
    closed: AtomicBool,
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with a fatal error once `writes` documents were created.
    pub fn unavailable_after(mut self, writes: usize) -> Self {
        self.unavailable_after = Some(writes);
        self
    }

    /// Reject the write of the document with this legacy id (record-level error).
    pub fn rejecting(mut self, legacy_id: &str) -> Self {
        self.rejected.insert(legacy_id.to_string());
        self
    }

    /// Let another writer create the document with this legacy id between
    /// the existence check and the create, so the create conflicts.
    pub fn racing(mut self, legacy_id: &str) -> Self {
        self.raced.insert(legacy_id.to_string());
        self
    }

    pub fn accounts(&self) -> Vec<(NewId, NewAccount)> {
        read(&self.state).accounts.clone()
    }

    pub fn categories(&self) -> Vec<(NewId, NewCategory)> {
        read(&self.state).categories.clone()
    }

    pub fn sheets(&self) -> Vec<(NewId, NewSheet)> {
        read(&self.state).sheets.clone()
    }

    pub fn transactions(&self) -> Vec<(NewId, NewTransaction)> {
        read(&self.state).transactions.clone()
    }

    /// Number of documents of `kind` currently stored.
    pub fn count(&self, kind: EntityKind) -> usize {
        read(&self.state).legacy_ids(kind).len()
    }

    /// Number of successful creates since the store was built.
    pub fn writes(&self) -> usize {
        read(&self.state).writes
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Accept calls again after `close`, like a fresh connection to the same data.
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Unavailable("store is closed".to_string()));
        }
        if let Some(limit) = self.unavailable_after {
            if read(&self.state).writes >= limit {
                return Err(StoreError::Unavailable("connection reset by peer".to_string()));
            }
        }
        Ok(())
    }

    fn check_rejected(&self, kind: EntityKind, legacy_id: &str) -> Result<(), StoreError> {
        if self.rejected.contains(legacy_id) {
            return Err(StoreError::Constraint(format!(
                "{} {legacy_id} rejected by store",
                kind.singular()
            )));
        }
        Ok(())
    }

    /// Whether a concurrent writer gets to store `legacy_id` first.
    fn loses_race(&self, state: &State, kind: EntityKind, legacy_id: &str) -> bool {
        self.raced.contains(legacy_id) && state.ensure_new(kind, legacy_id).is_ok()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn legacy_identities(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(LegacyId, NewId)>, StoreError> {
        self.check_available()?;
        Ok(read(&self.state).legacy_ids(kind))
    }

    async fn find_by_legacy_id(
        &self,
        kind: EntityKind,
        legacy_id: &str,
    ) -> Result<Option<NewId>, StoreError> {
        self.check_available()?;
        Ok(read(&self.state)
            .legacy_ids(kind)
            .into_iter()
            .find(|(l, _)| l == legacy_id)
            .map(|(_, id)| id))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<NewId, StoreError> {
        self.check_available()?;
        self.check_rejected(EntityKind::Account, &account.legacy_id)?;
        let mut state = write(&self.state);
        if self.loses_race(&state, EntityKind::Account, &account.legacy_id) {
            state.accounts.push((Uuid::new_v4(), account.clone()));
        }
        state.ensure_new(EntityKind::Account, &account.legacy_id)?;
        if state.accounts.iter().any(|(_, a)| a.email == account.email) {
            return Err(StoreError::Constraint(format!(
                "email {} is already registered",
                account.email
            )));
        }

        let id = Uuid::new_v4();
        state.accounts.push((id, account.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn create_category(&self, category: &NewCategory) -> Result<NewId, StoreError> {
        self.check_available()?;
        self.check_rejected(EntityKind::Category, &category.legacy_id)?;
        let mut state = write(&self.state);
        if self.loses_race(&state, EntityKind::Category, &category.legacy_id) {
            state.categories.push((Uuid::new_v4(), category.clone()));
        }
        state.ensure_new(EntityKind::Category, &category.legacy_id)?;
        if let Some(owner) = category.owner_id {
            state.ensure_ref(EntityKind::Account, owner)?;
        }
        if state
            .categories
            .iter()
            .any(|(_, c)| c.label == category.label && c.owner_id == category.owner_id)
        {
            return Err(StoreError::Constraint(format!(
                "category label {:?} already exists for this owner",
                category.label
            )));
        }

        let id = Uuid::new_v4();
        state.categories.push((id, category.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn create_sheet(&self, sheet: &NewSheet) -> Result<NewId, StoreError> {
        self.check_available()?;
        self.check_rejected(EntityKind::Sheet, &sheet.legacy_id)?;
        let mut state = write(&self.state);
        if self.loses_race(&state, EntityKind::Sheet, &sheet.legacy_id) {
            state.sheets.push((Uuid::new_v4(), sheet.clone()));
        }
        state.ensure_new(EntityKind::Sheet, &sheet.legacy_id)?;
        state.ensure_ref(EntityKind::Account, sheet.owner_id)?;

        let id = Uuid::new_v4();
        state.sheets.push((id, sheet.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<NewId, StoreError> {
        self.check_available()?;
        self.check_rejected(EntityKind::Transaction, &transaction.legacy_id)?;
        let mut state = write(&self.state);
        if self.loses_race(&state, EntityKind::Transaction, &transaction.legacy_id) {
            state.transactions.push((Uuid::new_v4(), transaction.clone()));
        }
        state.ensure_new(EntityKind::Transaction, &transaction.legacy_id)?;
        state.ensure_ref(EntityKind::Account, transaction.owner_id)?;
        state.ensure_ref(EntityKind::Sheet, transaction.sheet_id)?;
        if let Some(category) = transaction.category_id {
            state.ensure_ref(EntityKind::Category, category)?;
        }

        let id = Uuid::new_v4();
        state.transactions.push((id, transaction.clone()));
        state.writes += 1;
        Ok(id)
    }

    async fn first_shared_category(&self) -> Result<Option<SharedCategory>, StoreError> {
        self.check_available()?;
        Ok(read(&self.state)
            .categories
            .iter()
            .filter(|(_, c)| c.owner_id.is_none())
            .min_by_key(|(id, c)| (c.created_at, *id))
            .map(|(id, c)| SharedCategory {
                id: *id,
                label: c.label.clone(),
            }))
    }

    async fn assign_missing_categories(&self, category_id: NewId) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut state = write(&self.state);
        state.ensure_ref(EntityKind::Category, category_id)?;

        let mut updated = 0;
        for (_, transaction) in state.transactions.iter_mut() {
            if transaction.category_id.is_none() {
                transaction.category_id = Some(category_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(legacy_id: &str, email: &str) -> NewAccount {
        NewAccount {
            legacy_id: legacy_id.to_string(),
            email: email.to_string(),
            display_name: String::new(),
            credential: "!locked".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn category(legacy_id: &str, label: &str, owner_id: Option<NewId>) -> NewCategory {
        NewCategory {
            legacy_id: legacy_id.to_string(),
            label: label.to_string(),
            owner_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_legacy_id_conflicts() {
        let store = MemoryDocumentStore::new();
        store.create_account(&account("u1", "a@example.com")).await.unwrap();

        let err = store
            .create_account(&account("u1", "b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: EntityKind::Account, .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_category_label_is_unique_per_owner() {
        let store = MemoryDocumentStore::new();
        let owner = store.create_account(&account("u1", "a@example.com")).await.unwrap();

        store.create_category(&category("c1", "Food", None)).await.unwrap();
        store.create_category(&category("c2", "Food", Some(owner))).await.unwrap();

        let err = store
            .create_category(&category("c3", "Food", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(store.count(EntityKind::Category), 2);
    }

    #[tokio::test]
    async fn test_find_by_legacy_id() {
        let store = MemoryDocumentStore::new();
        let id = store.create_account(&account("u1", "a@example.com")).await.unwrap();

        let found = store.find_by_legacy_id(EntityKind::Account, "u1").await.unwrap();
        assert_eq!(found, Some(id));
        let missing = store.find_by_legacy_id(EntityKind::Account, "u2").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_racing_writer_wins_the_create() {
        let store = MemoryDocumentStore::new().racing("u1");

        let err = store
            .create_account(&account("u1", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: EntityKind::Account, .. }));
        assert_eq!(store.count(EntityKind::Account), 1);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_after_limit_is_fatal() {
        let store = MemoryDocumentStore::new().unavailable_after(1);
        store.create_account(&account("u1", "a@example.com")).await.unwrap();

        let err = store
            .create_account(&account("u2", "b@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
