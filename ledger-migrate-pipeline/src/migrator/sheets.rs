use async_trait::async_trait;
use ledger_migrate_repository::{DocumentStore, SourceError, StoreError};
use ledger_migrate_shared::{EntityKind, LegacySheet, NewId, NewSheet, PageWindow, SourceRow};

use super::{require, EntityMigrator, Unresolved};
use crate::identity::IdentityMaps;
use crate::reader::SourceReader;
use crate::run_log::RunLog;

/// Migrates record sheets. The owner must already be migrated.
#[derive(Debug, Default)]
pub struct SheetMigrator;

#[async_trait]
impl EntityMigrator for SheetMigrator {
    type Record = LegacySheet;
    type Document = NewSheet;

    const KIND: EntityKind = EntityKind::Sheet;

    async fn fetch(
        &self,
        reader: &SourceReader,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacySheet>>, SourceError> {
        reader.sheets(window).await
    }

    fn legacy_id(record: &LegacySheet) -> &str {
        &record.legacy_id
    }

    fn describe(record: &LegacySheet) -> String {
        record.name.clone()
    }

    fn build(
        &self,
        record: &LegacySheet,
        maps: &IdentityMaps,
        _log: &mut RunLog,
    ) -> Result<NewSheet, Unresolved> {
        let owner_id = require(maps, EntityKind::Account, &record.owner_legacy_id)?;

        Ok(NewSheet {
            legacy_id: record.legacy_id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            owner_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        document: &NewSheet,
    ) -> Result<NewId, StoreError> {
        store.create_sheet(document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sheet(owner: &str) -> LegacySheet {
        LegacySheet {
            legacy_id: "s1".to_string(),
            name: "Household".to_string(),
            description: String::new(),
            owner_legacy_id: owner.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_is_remapped() {
        let mut maps = IdentityMaps::default();
        let owner = Uuid::new_v4();
        maps.get_mut(EntityKind::Account).insert("u1", owner);

        let doc = SheetMigrator
            .build(&sheet("u1"), &maps, &mut RunLog::new())
            .unwrap();
        assert_eq!(doc.owner_id, owner);
        assert_eq!(doc.legacy_id, "s1");
    }

    #[test]
    fn test_unknown_owner_is_unresolved() {
        let mut maps = IdentityMaps::default();
        maps.get_mut(EntityKind::Account).insert("u1", Uuid::new_v4());

        let err = SheetMigrator
            .build(&sheet("u9"), &maps, &mut RunLog::new())
            .unwrap_err();
        assert_eq!(err, Unresolved::new(EntityKind::Account, "u9"));
    }
}
