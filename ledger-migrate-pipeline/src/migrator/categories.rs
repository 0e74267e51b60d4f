use async_trait::async_trait;
use ledger_migrate_repository::{DocumentStore, SourceError, StoreError};
use ledger_migrate_shared::{
    EntityKind, LegacyCategory, NewCategory, NewId, PageWindow, SourceRow,
};

use super::{require, EntityMigrator, Unresolved};
use crate::identity::IdentityMaps;
use crate::reader::SourceReader;
use crate::run_log::RunLog;

/// Migrates transaction categories.
///
/// A category without an owner stays shared. A category whose owner did not
/// migrate is unresolved; it is never turned into a shared one.
#[derive(Debug, Default)]
pub struct CategoryMigrator;

#[async_trait]
impl EntityMigrator for CategoryMigrator {
    type Record = LegacyCategory;
    type Document = NewCategory;

    const KIND: EntityKind = EntityKind::Category;

    async fn fetch(
        &self,
        reader: &SourceReader,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyCategory>>, SourceError> {
        reader.categories(window).await
    }

    fn legacy_id(record: &LegacyCategory) -> &str {
        &record.legacy_id
    }

    fn describe(record: &LegacyCategory) -> String {
        match &record.owner_legacy_id {
            Some(_) => record.label.clone(),
            None => format!("{} (shared)", record.label),
        }
    }

    fn build(
        &self,
        record: &LegacyCategory,
        maps: &IdentityMaps,
        _log: &mut RunLog,
    ) -> Result<NewCategory, Unresolved> {
        let owner_id = record
            .owner_legacy_id
            .as_deref()
            .map(|owner| require(maps, EntityKind::Account, owner))
            .transpose()?;

        Ok(NewCategory {
            legacy_id: record.legacy_id.clone(),
            label: record.label.clone(),
            owner_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        document: &NewCategory,
    ) -> Result<NewId, StoreError> {
        store.create_category(document).await
    }
}
