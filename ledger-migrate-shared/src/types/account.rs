use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::LegacyId;

/// An account as read from the legacy auth table.
///
/// `email` is already trimmed and lower-cased; `display_name` defaults to an
/// empty string when the legacy metadata has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAccount {
    pub legacy_id: LegacyId,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account document ready to be written to the new store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub legacy_id: LegacyId,
    pub email: String,
    pub display_name: String,
    /// Placeholder credential; never a usable password.
    pub credential: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
