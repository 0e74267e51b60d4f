//! Entity migrators and the stage loop that drives them.
//!
//! A migrator knows how to fetch one entity type, how to turn a legacy record
//! into a new document (remapping its references through the identity maps)
//! and how to write that document. Everything else is shared and lives in
//! [`StageRunner`]: paging, existence checks, identity map updates, per-record
//! failure isolation and the run log bookkeeping.
mod accounts;
mod categories;
mod sheets;
mod transactions;

pub use accounts::AccountMigrator;
pub use categories::CategoryMigrator;
pub use sheets::SheetMigrator;
pub use transactions::TransactionMigrator;

use std::str::FromStr;

use async_trait::async_trait;
use ledger_migrate_repository::{DocumentStore, SourceError, StoreError};
use ledger_migrate_shared::{EntityKind, LegacyId, NewId, PageWindow, SourceRow};
use tracing::debug;

use crate::errors::{InvalidPolicy, MigrationError};
use crate::identity::IdentityMaps;
use crate::reader::SourceReader;
use crate::run_log::{ParkedRecord, RunLog, SkipReason};

/// Number of migrated records between two progress lines for quiet stages.
pub const PROGRESS_INTERVAL: u64 = 100;

/// What to do with a record whose required reference does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Skip the record with a warning.
    #[default]
    Drop,
    /// Skip the record with a warning and keep it for manual review.
    Park,
    /// Abort the run.
    Fail,
}

impl UnresolvedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Drop => "drop",
            UnresolvedPolicy::Park => "park",
            UnresolvedPolicy::Fail => "fail",
        }
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = InvalidPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" | "skip" => Ok(UnresolvedPolicy::Drop),
            "park" => Ok(UnresolvedPolicy::Park),
            "fail" | "fatal" => Ok(UnresolvedPolicy::Fail),
            _ => Err(InvalidPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A required reference that is missing from its identity map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub target: EntityKind,
    pub legacy_id: LegacyId,
}

impl Unresolved {
    pub fn new(target: EntityKind, legacy_id: &str) -> Self {
        Self {
            target,
            legacy_id: legacy_id.to_string(),
        }
    }
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} not found in {} map",
            self.target.singular(),
            self.legacy_id,
            self.target
        )
    }
}

/// Resolves a required reference through the identity maps.
pub(crate) fn require(
    maps: &IdentityMaps,
    target: EntityKind,
    legacy_id: &str,
) -> Result<NewId, Unresolved> {
    maps.resolve(target, legacy_id)
        .ok_or_else(|| Unresolved::new(target, legacy_id))
}

/// Per-type migration behaviour.
#[async_trait]
pub trait EntityMigrator: Send + Sync {
    type Record: Send + Sync;
    type Document: Send + Sync;

    /// The entity type this migrator moves.
    const KIND: EntityKind;

    /// Whether every migrated record gets its own success line.
    const LOG_EACH_RECORD: bool = true;

    async fn fetch(
        &self,
        reader: &SourceReader,
        window: PageWindow,
    ) -> Result<Vec<SourceRow<Self::Record>>, SourceError>;

    fn legacy_id(record: &Self::Record) -> &str;

    /// Human readable name of the record for log lines.
    fn describe(record: &Self::Record) -> String;

    /// Builds the new document, substituting every reference.
    ///
    /// Optional references that do not resolve are dropped here, with a
    /// warning in `log`; required ones make the record [`Unresolved`].
    fn build(
        &self,
        record: &Self::Record,
        maps: &IdentityMaps,
        log: &mut RunLog,
    ) -> Result<Self::Document, Unresolved>;

    async fn write(
        &self,
        store: &dyn DocumentStore,
        document: &Self::Document,
    ) -> Result<NewId, StoreError>;
}

/// Runs one stage: every page of one entity type, record by record.
pub struct StageRunner<'a> {
    reader: &'a SourceReader,
    store: &'a dyn DocumentStore,
    policy: UnresolvedPolicy,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        reader: &'a SourceReader,
        store: &'a dyn DocumentStore,
        policy: UnresolvedPolicy,
    ) -> Self {
        Self {
            reader,
            store,
            policy,
        }
    }

    /// Migrates every record of `M::KIND`.
    ///
    /// Returns an error only for stage-fatal conditions. The identity map of
    /// `M::KIND` is seeded from the store first, so documents written by a
    /// previous run are recognised without a lookup.
    pub async fn run<M: EntityMigrator>(
        &self,
        migrator: &M,
        maps: &mut IdentityMaps,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        let kind = M::KIND;
        log.info(format!("Starting {kind} migration..."));

        let existing = self.store.legacy_identities(kind).await?;
        let seeded = maps.get_mut(kind).seed(existing);
        if seeded > 0 {
            log.info(format!("Found {seeded} {kind} already in the new store"));
        }

        let mut window = self.reader.first_window();
        let mut fetched_total = 0;
        loop {
            let rows = migrator.fetch(self.reader, window).await?;
            let fetched = rows.len();
            fetched_total += fetched;

            if fetched > 0 {
                log.info(format!(
                    "Processing batch of {fetched} {kind} ({} to {})",
                    window.offset,
                    window.offset + fetched as u64 - 1
                ));
            }

            for row in rows {
                self.migrate_row(migrator, row, maps, log).await?;
            }

            if window.is_last(fetched) {
                break;
            }
            window = window.next();
        }

        let stage = log.stage(kind);
        log.success(format!(
            "{} migration completed. Migrated {} out of {fetched_total} {kind}, skipped {}.",
            capitalize(kind.singular()),
            stage.migrated,
            stage.skipped_total()
        ));
        Ok(())
    }

    async fn migrate_row<M: EntityMigrator>(
        &self,
        migrator: &M,
        row: SourceRow<M::Record>,
        maps: &mut IdentityMaps,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        let kind = M::KIND;
        let record = match row {
            Ok(record) => record,
            Err(malformed) => {
                log.error(format!("Skipping {malformed}"));
                log.record_skipped(kind, SkipReason::Malformed);
                return Ok(());
            }
        };
        let legacy_id = M::legacy_id(&record);

        let existing = match maps.resolve(kind, legacy_id) {
            Some(id) => Some(id),
            None => match self.store.find_by_legacy_id(kind, legacy_id).await {
                Ok(found) => found,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    log.error(format!(
                        "Failed to look up {} {}: {e}",
                        kind.singular(),
                        M::describe(&record)
                    ));
                    log.record_skipped(kind, SkipReason::WriteFailed);
                    return Ok(());
                }
            },
        };
        if let Some(id) = existing {
            already_present::<M>(&record, id, maps, log);
            return Ok(());
        }

        let document = match migrator.build(&record, maps, log) {
            Ok(document) => document,
            Err(unresolved) => return self.unresolved(kind, legacy_id, &unresolved, log),
        };

        match migrator.write(self.store, &document).await {
            Ok(id) => {
                maps.get_mut(kind).insert(legacy_id, id);
                log.record_migrated(kind);
                if M::LOG_EACH_RECORD {
                    log.success(format!(
                        "Migrated {}: {}",
                        kind.singular(),
                        M::describe(&record)
                    ));
                } else {
                    let migrated = log.stage(kind).migrated;
                    if migrated % PROGRESS_INTERVAL == 0 {
                        log.info(format!("Migrated {migrated} {kind} so far..."));
                    }
                }
                debug!(kind = %kind, legacy_id, new_id = %id, "Created document");
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(conflict @ StoreError::Conflict { .. }) => {
                // Another writer created the document after the existence check.
                match self.store.find_by_legacy_id(kind, legacy_id).await {
                    Ok(Some(id)) => {
                        already_present::<M>(&record, id, maps, log);
                        Ok(())
                    }
                    Ok(None) => {
                        log.error(format!(
                            "Failed to migrate {} {}: {conflict}",
                            kind.singular(),
                            M::describe(&record)
                        ));
                        log.record_skipped(kind, SkipReason::WriteFailed);
                        Ok(())
                    }
                    Err(e) if e.is_fatal() => Err(e.into()),
                    Err(e) => {
                        log.error(format!(
                            "Failed to look up {} {}: {e}",
                            kind.singular(),
                            M::describe(&record)
                        ));
                        log.record_skipped(kind, SkipReason::WriteFailed);
                        Ok(())
                    }
                }
            }
            Err(e) => {
                log.error(format!(
                    "Failed to migrate {} {}: {e}",
                    kind.singular(),
                    M::describe(&record)
                ));
                log.record_skipped(kind, SkipReason::WriteFailed);
                Ok(())
            }
        }
    }

    fn unresolved(
        &self,
        kind: EntityKind,
        legacy_id: &str,
        unresolved: &Unresolved,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        let reason = unresolved.to_string();
        match self.policy {
            UnresolvedPolicy::Fail => Err(MigrationError::UnresolvedReference {
                kind,
                legacy_id: legacy_id.to_string(),
                reason,
            }),
            UnresolvedPolicy::Drop | UnresolvedPolicy::Park => {
                log.warning(format!(
                    "Skipping {} {legacy_id}: {reason}",
                    kind.singular()
                ));
                if self.policy == UnresolvedPolicy::Park {
                    log.park(ParkedRecord {
                        kind,
                        legacy_id: legacy_id.to_string(),
                        reason,
                    });
                }
                log.record_skipped(kind, SkipReason::UnresolvedReference);
                Ok(())
            }
        }
    }
}

/// Records `record` as already migrated under `id`.
fn already_present<M: EntityMigrator>(
    record: &M::Record,
    id: NewId,
    maps: &mut IdentityMaps,
    log: &mut RunLog,
) {
    let kind = M::KIND;
    log.info(format!(
        "{} {} already exists in the new store, skipping...",
        capitalize(kind.singular()),
        M::describe(record)
    ));
    maps.get_mut(kind).insert(M::legacy_id(record), id);
    log.record_skipped(kind, SkipReason::AlreadyPresent);
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
