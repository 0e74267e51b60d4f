use serde::Serialize;

use crate::types::{EntityKind, LegacyId};

/// A legacy row that could not be turned into a record.
///
/// Produced by the source adapters while validating rows, so that a single
/// bad row is reported and skipped instead of failing the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRecord {
    pub kind: EntityKind,
    pub legacy_id: Option<LegacyId>,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(kind: EntityKind, legacy_id: Option<LegacyId>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            legacy_id,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.legacy_id {
            Some(id) => write!(f, "malformed {} {}: {}", self.kind.singular(), id, self.reason),
            None => write!(f, "malformed {}: {}", self.kind.singular(), self.reason),
        }
    }
}

/// One item of a legacy page: a validated record or the reason it was rejected.
pub type SourceRow<T> = Result<T, MalformedRecord>;
