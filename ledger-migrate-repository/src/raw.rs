//! Loosely typed legacy rows and their validation into record types.
//!
//! The legacy tables are permissive: most columns are nullable, amounts are
//! arbitrary numerics and the transaction kind is free text. Every source
//! implementation decodes rows into these `Raw*` shapes and calls `validate`,
//! so defaults and rejections are decided in exactly one place.
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use ledger_migrate_shared::{
    EntityKind, LegacyAccount, LegacyCategory, LegacySheet, LegacyTransaction, MalformedRecord,
    SourceRow, TransactionKind,
};

/// A row of the legacy `auth.users` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAccount {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of the legacy `transaction_categories` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCategory {
    pub id: String,
    pub label: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of the legacy `record_sheets` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of the legacy `transaction_records` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransaction {
    pub id: String,
    pub amount: Option<BigDecimal>,
    pub description: Option<String>,
    pub transaction_type: Option<String>,
    pub user_id: Option<String>,
    pub record_sheet_id: Option<String>,
    pub category_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct Check<'a> {
    kind: EntityKind,
    id: &'a str,
}

impl<'a> Check<'a> {
    fn new(kind: EntityKind, id: &'a str) -> Result<Self, MalformedRecord> {
        if id.trim().is_empty() {
            return Err(MalformedRecord::new(kind, None, "missing identifier"));
        }
        Ok(Self { kind, id })
    }

    fn reject(&self, reason: impl Into<String>) -> MalformedRecord {
        MalformedRecord::new(self.kind, Some(self.id.to_string()), reason)
    }

    fn text(&self, field: &str, value: Option<String>) -> Result<String, MalformedRecord> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| self.reject(format!("missing {field}")))
    }

    fn timestamps(
        &self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), MalformedRecord> {
        let created_at = created_at.ok_or_else(|| self.reject("missing created_at"))?;
        Ok((created_at, updated_at.unwrap_or(created_at)))
    }
}

fn optional_ref(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl RawAccount {
    pub fn validate(self) -> SourceRow<LegacyAccount> {
        let check = Check::new(EntityKind::Account, &self.id)?;
        let email = check.text("email", self.email)?.to_lowercase();
        let (created_at, updated_at) = check.timestamps(self.created_at, self.updated_at)?;

        Ok(LegacyAccount {
            legacy_id: self.id.clone(),
            email,
            display_name: optional_text(self.full_name),
            created_at,
            updated_at,
        })
    }
}

impl RawCategory {
    pub fn validate(self) -> SourceRow<LegacyCategory> {
        let check = Check::new(EntityKind::Category, &self.id)?;
        let label = check.text("label", self.label)?;
        let (created_at, updated_at) = check.timestamps(self.created_at, self.updated_at)?;

        Ok(LegacyCategory {
            legacy_id: self.id.clone(),
            label,
            owner_legacy_id: optional_ref(self.user_id),
            created_at,
            updated_at,
        })
    }
}

impl RawSheet {
    pub fn validate(self) -> SourceRow<LegacySheet> {
        let check = Check::new(EntityKind::Sheet, &self.id)?;
        let name = check.text("name", self.name)?;
        let owner = check.text("user_id", self.user_id)?;
        let (created_at, updated_at) = check.timestamps(self.created_at, self.updated_at)?;

        Ok(LegacySheet {
            legacy_id: self.id.clone(),
            name,
            description: optional_text(self.description),
            owner_legacy_id: owner,
            created_at,
            updated_at,
        })
    }
}

impl RawTransaction {
    pub fn validate(self) -> SourceRow<LegacyTransaction> {
        let check = Check::new(EntityKind::Transaction, &self.id)?;
        let amount = self.amount.ok_or_else(|| check.reject("missing amount"))?;
        if !amount.is_integer() {
            return Err(check.reject(format!("amount {amount} is not in minor units")));
        }
        let amount = amount
            .to_i64()
            .ok_or_else(|| check.reject(format!("amount {amount} is out of range")))?;

        let kind = match optional_ref(self.transaction_type) {
            Some(kind) => kind
                .parse::<TransactionKind>()
                .map_err(|e| check.reject(e.to_string()))?,
            None => TransactionKind::default(),
        };
        let owner = check.text("user_id", self.user_id)?;
        let sheet = check.text("record_sheet_id", self.record_sheet_id)?;
        let (created_at, updated_at) = check.timestamps(self.created_at, self.updated_at)?;

        Ok(LegacyTransaction {
            legacy_id: self.id.clone(),
            amount,
            description: optional_text(self.description),
            kind,
            owner_legacy_id: owner,
            sheet_legacy_id: sheet,
            category_legacy_id: optional_ref(self.category_id),
            created_at,
            updated_at,
        })
    }
}
