use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{LegacyId, NewId};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind: {0:?}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(UnknownTransactionKind(s.to_string())),
        }
    }
}

/// A transaction as read from the legacy store.
///
/// `amount` is in minor currency units. `kind` has already been defaulted to
/// [`TransactionKind::Expense`] when the legacy row carried none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTransaction {
    pub legacy_id: LegacyId,
    pub amount: i64,
    pub description: String,
    pub kind: TransactionKind,
    pub owner_legacy_id: LegacyId,
    pub sheet_legacy_id: LegacyId,
    pub category_legacy_id: Option<LegacyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction document with every reference already remapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub legacy_id: LegacyId,
    pub amount: i64,
    pub description: String,
    pub kind: TransactionKind,
    pub owner_id: NewId,
    pub sheet_id: NewId,
    pub category_id: Option<NewId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
