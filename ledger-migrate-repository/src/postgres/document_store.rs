//! PostgreSQL implementation of the new document store.
//!
//! ## Database Tables
//!
//! - `accounts`: migrated users, unique on `email` and `legacy_id`
//! - `categories`: unique on `legacy_id` and on `(label, user_id)`, null owners included
//! - `record_sheets`: owned by an account
//! - `transactions`: reference an account, a sheet and optionally a category
use async_trait::async_trait;
use ledger_migrate_shared::{
    EntityKind, LegacyId, NewAccount, NewCategory, NewId, NewSheet, NewTransaction,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::interfaces::{DocumentStore, SharedCategory};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed document store.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a store over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the schema migrations bundled with this crate.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn table(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Account => "accounts",
            EntityKind::Category => "categories",
            EntityKind::Sheet => "record_sheets",
            EntityKind::Transaction => "transactions",
        }
    }
}

/// Maps an insert failure to a record-level error where the database allows it.
///
/// A unique violation on the `legacy_id` constraint is a conflict with an
/// already migrated document; any other integrity violation only concerns the
/// record being written. Everything else is passed through untouched.
fn classify_insert_error(kind: EntityKind, legacy_id: &str, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        let is_legacy_key = db_error
            .constraint()
            .map(|c| c.ends_with("legacy_id_key"))
            .unwrap_or(false);

        if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) && is_legacy_key {
            return StoreError::Conflict {
                kind,
                legacy_id: legacy_id.to_string(),
            };
        }
        if db_error
            .code()
            .map(|code| code.starts_with("23"))
            .unwrap_or(false)
        {
            return StoreError::Constraint(db_error.message().to_string());
        }
    }
    StoreError::DatabaseError(error)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn legacy_identities(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(LegacyId, NewId)>, StoreError> {
        let query = format!(
            "SELECT legacy_id, id FROM {} WHERE legacy_id IS NOT NULL",
            Self::table(kind)
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<(LegacyId, NewId), StoreError> {
                Ok((row.try_get("legacy_id")?, row.try_get("id")?))
            })
            .collect()
    }

    async fn find_by_legacy_id(
        &self,
        kind: EntityKind,
        legacy_id: &str,
    ) -> Result<Option<NewId>, StoreError> {
        let query = format!("SELECT id FROM {} WHERE legacy_id = $1", Self::table(kind));
        let id = sqlx::query_scalar::<_, Uuid>(&query)
            .bind(legacy_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<NewId, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO accounts (email, full_name, password, legacy_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(&account.credential)
        .bind(&account.legacy_id)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_insert_error(EntityKind::Account, &account.legacy_id, e))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<NewId, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO categories (label, user_id, legacy_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&category.label)
        .bind(category.owner_id)
        .bind(&category.legacy_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_insert_error(EntityKind::Category, &category.legacy_id, e))
    }

    async fn create_sheet(&self, sheet: &NewSheet) -> Result<NewId, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO record_sheets (name, description, user_id, legacy_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&sheet.name)
        .bind(&sheet.description)
        .bind(sheet.owner_id)
        .bind(&sheet.legacy_id)
        .bind(sheet.created_at)
        .bind(sheet.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_insert_error(EntityKind::Sheet, &sheet.legacy_id, e))
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<NewId, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO transactions \
                (record_sheet_id, user_id, amount, description, category_id, transaction_type, \
                 legacy_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(transaction.sheet_id)
        .bind(transaction.owner_id)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(transaction.category_id)
        .bind(transaction.kind.as_str())
        .bind(&transaction.legacy_id)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_insert_error(EntityKind::Transaction, &transaction.legacy_id, e))
    }

    async fn first_shared_category(&self) -> Result<Option<SharedCategory>, StoreError> {
        let row = sqlx::query(
            "SELECT id, label FROM categories WHERE user_id IS NULL ORDER BY created_at, id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(SharedCategory {
                id: row.try_get("id")?,
                label: row.try_get("label")?,
            })),
            None => Ok(None),
        }
    }

    async fn assign_missing_categories(&self, category_id: NewId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE transactions SET category_id = $1, updated_at = now() WHERE category_id IS NULL",
        )
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
