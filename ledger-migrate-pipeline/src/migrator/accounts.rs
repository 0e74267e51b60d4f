use async_trait::async_trait;
use ledger_migrate_repository::{DocumentStore, SourceError, StoreError};
use ledger_migrate_shared::{EntityKind, LegacyAccount, NewAccount, NewId, PageWindow, SourceRow};
use rand::{distributions::Alphanumeric, Rng};

use super::{EntityMigrator, Unresolved};
use crate::identity::IdentityMaps;
use crate::reader::SourceReader;
use crate::run_log::RunLog;

const CREDENTIAL_LENGTH: usize = 32;

/// Migrates legacy auth users into accounts.
///
/// Password hashes are not carried over. Each account gets a random
/// placeholder credential that no password can match, so every migrated user
/// has to go through password reset.
#[derive(Debug, Default)]
pub struct AccountMigrator;

/// A credential that is never the output of a password hash.
pub fn placeholder_credential() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LENGTH)
        .map(char::from)
        .collect();
    format!("!{random}")
}

#[async_trait]
impl EntityMigrator for AccountMigrator {
    type Record = LegacyAccount;
    type Document = NewAccount;

    const KIND: EntityKind = EntityKind::Account;

    async fn fetch(
        &self,
        reader: &SourceReader,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<LegacyAccount>>, SourceError> {
        reader.accounts(window).await
    }

    fn legacy_id(record: &LegacyAccount) -> &str {
        &record.legacy_id
    }

    fn describe(record: &LegacyAccount) -> String {
        record.email.clone()
    }

    fn build(
        &self,
        record: &LegacyAccount,
        _maps: &IdentityMaps,
        _log: &mut RunLog,
    ) -> Result<NewAccount, Unresolved> {
        Ok(NewAccount {
            legacy_id: record.legacy_id.clone(),
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            credential: placeholder_credential(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        document: &NewAccount,
    ) -> Result<NewId, StoreError> {
        store.create_account(document).await
    }
}
