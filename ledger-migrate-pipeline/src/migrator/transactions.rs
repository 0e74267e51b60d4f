use async_trait::async_trait;
use ledger_migrate_repository::{DocumentStore, SourceError, StoreError};
use ledger_migrate_shared::{
    EntityKind, LegacyTransaction, NewId, NewTransaction, PageWindow, SourceRow,
};

use super::{require, EntityMigrator, Unresolved};
use crate::identity::IdentityMaps;
use crate::reader::SourceReader;
use crate::run_log::RunLog;

/// Migrates transaction records.
///
/// Owner and sheet are required. A category that did not migrate is dropped
/// with a warning; `fix-category-mapping` can assign one afterwards.
#[derive(Debug, Default)]
pub struct TransactionMigrator;

#[async_trait]
impl EntityMigrator for TransactionMigrator {
    type Record = LegacyTransaction;
    type Document = NewTransaction;

    const KIND: EntityKind = EntityKind::Transaction;
    const LOG_EACH_RECORD: bool = false;

    async fn fetch(
        &self,
        reader: &SourceReader,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyTransaction>>, SourceError> {
        reader.transactions(window).await
    }

    fn legacy_id(record: &LegacyTransaction) -> &str {
        &record.legacy_id
    }

    fn describe(record: &LegacyTransaction) -> String {
        format!("{} ({} {})", record.legacy_id, record.kind, record.amount)
    }

    fn build(
        &self,
        record: &LegacyTransaction,
        maps: &IdentityMaps,
        log: &mut RunLog,
    ) -> Result<NewTransaction, Unresolved> {
        let owner_id = require(maps, EntityKind::Account, &record.owner_legacy_id)?;
        let sheet_id = require(maps, EntityKind::Sheet, &record.sheet_legacy_id)?;

        let category_id = match record.category_legacy_id.as_deref() {
            None => None,
            Some(category) => {
                let resolved = maps.resolve(EntityKind::Category, category);
                if resolved.is_none() {
                    log.warning(format!(
                        "Transaction {}: category {category} not found in categories map, migrating without category",
                        record.legacy_id
                    ));
                }
                resolved
            }
        };

        Ok(NewTransaction {
            legacy_id: record.legacy_id.clone(),
            amount: record.amount,
            description: record.description.clone(),
            kind: record.kind,
            owner_id,
            sheet_id,
            category_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        document: &NewTransaction,
    ) -> Result<NewId, StoreError> {
        store.create_transaction(document).await
    }
}
