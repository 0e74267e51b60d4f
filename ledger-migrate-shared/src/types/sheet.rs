use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LegacyId, NewId};

/// A record sheet as read from the legacy store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySheet {
    pub legacy_id: LegacyId,
    pub name: String,
    pub description: String,
    pub owner_legacy_id: LegacyId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSheet {
    pub legacy_id: LegacyId,
    pub name: String,
    pub description: String,
    pub owner_id: NewId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
