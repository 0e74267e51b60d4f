//! Reads from the legacy Supabase database.
//!
//! Each table is read one window at a time, ordered by `(created_at, id)` so
//! that pages stay stable across the run. Identifiers are read as text, which
//! keeps the record types independent of the legacy key type.
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use ledger_migrate_shared::{
    EntityKind, LegacyAccount, LegacyCategory, LegacySheet, LegacyTransaction, MalformedRecord,
    PageWindow, SourceRow,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::errors::SourceError;
use crate::raw::{RawAccount, RawCategory, RawSheet, RawTransaction};
use crate::LegacySource;

const ACCOUNTS_QUERY: &str = "SELECT id::text AS id, email, raw_user_meta_data->>'full_name' AS full_name, \
            created_at, updated_at \
     FROM auth.users ORDER BY created_at, id LIMIT $1 OFFSET $2";

const CATEGORIES_QUERY: &str = "SELECT id::text AS id, label, user_id::text AS user_id, created_at, updated_at \
     FROM transaction_categories ORDER BY created_at, id LIMIT $1 OFFSET $2";

const SHEETS_QUERY: &str = "SELECT id::text AS id, name, description, user_id::text AS user_id, created_at, updated_at \
     FROM record_sheets ORDER BY created_at, id LIMIT $1 OFFSET $2";

const TRANSACTIONS_QUERY: &str = "SELECT id::text AS id, amount::numeric AS amount, description, \
            transaction_type::text AS transaction_type, user_id::text AS user_id, \
            record_sheet_id::text AS record_sheet_id, category_id::text AS category_id, \
            created_at, updated_at \
     FROM transaction_records ORDER BY created_at, id LIMIT $1 OFFSET $2";

/// Read-only access to the legacy Supabase tables.
pub struct PostgresLegacySource {
    pool: PgPool,
}

impl PostgresLegacySource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        kind: EntityKind,
        query: &'static str,
        window: PageWindow,
    ) -> Result<Vec<PgRow>, SourceError> {
        let rows = sqlx::query(query)
            .bind(bigint(kind, "limit", window.limit)?)
            .bind(bigint(kind, "offset", window.offset)?)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            kind = %kind,
            offset = window.offset,
            limit = window.limit,
            fetched = rows.len(),
            "Read legacy page"
        );
        Ok(rows)
    }
}

/// Converts a window bound to the `BIGINT` Postgres expects for `LIMIT`/`OFFSET`.
fn bigint(kind: EntityKind, name: &str, value: u64) -> Result<i64, SourceError> {
    i64::try_from(value).map_err(|_| SourceError::Unavailable {
        kind,
        message: format!("page {name} {value} exceeds the BIGINT range"),
    })
}

/// Decodes one column, turning a decode failure into a rejection of the row.
fn column<'r, T>(row: &'r PgRow, kind: EntityKind, id: &str, name: &str) -> Result<T, MalformedRecord>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| {
        MalformedRecord::new(kind, Some(id.to_string()), format!("cannot decode {name}: {e}"))
    })
}

fn row_id(row: &PgRow, kind: EntityKind) -> Result<String, MalformedRecord> {
    row.try_get::<Option<String>, _>("id")
        .ok()
        .flatten()
        .ok_or_else(|| MalformedRecord::new(kind, None, "missing identifier"))
}

fn account_row(row: &PgRow) -> SourceRow<LegacyAccount> {
    let kind = EntityKind::Account;
    let id = row_id(row, kind)?;
    RawAccount {
        email: column::<Option<String>>(row, kind, &id, "email")?,
        full_name: column::<Option<String>>(row, kind, &id, "full_name")?,
        created_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "created_at")?,
        updated_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "updated_at")?,
        id,
    }
    .validate()
}

fn category_row(row: &PgRow) -> SourceRow<LegacyCategory> {
    let kind = EntityKind::Category;
    let id = row_id(row, kind)?;
    RawCategory {
        label: column::<Option<String>>(row, kind, &id, "label")?,
        user_id: column::<Option<String>>(row, kind, &id, "user_id")?,
        created_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "created_at")?,
        updated_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "updated_at")?,
        id,
    }
    .validate()
}

fn sheet_row(row: &PgRow) -> SourceRow<LegacySheet> {
    let kind = EntityKind::Sheet;
    let id = row_id(row, kind)?;
    RawSheet {
        name: column::<Option<String>>(row, kind, &id, "name")?,
        description: column::<Option<String>>(row, kind, &id, "description")?,
        user_id: column::<Option<String>>(row, kind, &id, "user_id")?,
        created_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "created_at")?,
        updated_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "updated_at")?,
        id,
    }
    .validate()
}

fn transaction_row(row: &PgRow) -> SourceRow<LegacyTransaction> {
    let kind = EntityKind::Transaction;
    let id = row_id(row, kind)?;
    RawTransaction {
        amount: column::<Option<BigDecimal>>(row, kind, &id, "amount")?,
        description: column::<Option<String>>(row, kind, &id, "description")?,
        transaction_type: column::<Option<String>>(row, kind, &id, "transaction_type")?,
        user_id: column::<Option<String>>(row, kind, &id, "user_id")?,
        record_sheet_id: column::<Option<String>>(row, kind, &id, "record_sheet_id")?,
        category_id: column::<Option<String>>(row, kind, &id, "category_id")?,
        created_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "created_at")?,
        updated_at: column::<Option<DateTime<Utc>>>(row, kind, &id, "updated_at")?,
        id,
    }
    .validate()
}

#[async_trait]
impl LegacySource for PostgresLegacySource {
    async fn read_accounts(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyAccount>>, SourceError> {
        let rows = self.fetch(EntityKind::Account, ACCOUNTS_QUERY, window).await?;
        Ok(rows.iter().map(account_row).collect())
    }

    async fn read_categories(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyCategory>>, SourceError> {
        let rows = self.fetch(EntityKind::Category, CATEGORIES_QUERY, window).await?;
        Ok(rows.iter().map(category_row).collect())
    }

    async fn read_sheets(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacySheet>>, SourceError> {
        let rows = self.fetch(EntityKind::Sheet, SHEETS_QUERY, window).await?;
        Ok(rows.iter().map(sheet_row).collect())
    }

    async fn read_transactions(
        &self,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyTransaction>>, SourceError> {
        let rows = self
            .fetch(EntityKind::Transaction, TRANSACTIONS_QUERY, window)
            .await?;
        Ok(rows.iter().map(transaction_row).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
