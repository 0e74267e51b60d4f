use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LegacyId, NewId};

/// A transaction category as read from the legacy store.
///
/// `owner_legacy_id` is `None` for shared categories visible to every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCategory {
    pub legacy_id: LegacyId,
    pub label: String,
    pub owner_legacy_id: Option<LegacyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category document for the new store. Labels are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub legacy_id: LegacyId,
    pub label: String,
    pub owner_id: Option<NewId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
