//! Orchestrator module for the migration pipeline.
//!
//! Runs the entity stages in dependency order and owns the teardown of both
//! stores.

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Instant;

use ledger_migrate_repository::{DocumentStore, LegacySource};
use ledger_migrate_shared::EntityKind;
use tracing::{info, instrument};

use crate::errors::MigrationError;
use crate::identity::IdentityMaps;
use crate::migrator::{
    AccountMigrator, CategoryMigrator, SheetMigrator, StageRunner, TransactionMigrator,
    UnresolvedPolicy,
};
use crate::reader::{SourceReader, DEFAULT_PAGE_SIZE};
use crate::run_log::{RunLog, RunSummary};

/// A pipeline stage. Each stage has exactly one successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Accounts,
    Categories,
    Sheets,
    Transactions,
    Done,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Accounts => Stage::Categories,
            Stage::Categories => Stage::Sheets,
            Stage::Sheets => Stage::Transactions,
            Stage::Transactions | Stage::Done => Stage::Done,
        }
    }

    /// The entity type migrated by this stage; `None` for [`Stage::Done`].
    pub fn kind(self) -> Option<EntityKind> {
        match self {
            Stage::Accounts => Some(EntityKind::Account),
            Stage::Categories => Some(EntityKind::Category),
            Stage::Sheets => Some(EntityKind::Sheet),
            Stage::Transactions => Some(EntityKind::Transaction),
            Stage::Done => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind}"),
            None => write!(f, "done"),
        }
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Number of legacy rows fetched per page.
    pub page_size: NonZeroU64,
    /// Handling of records whose required references do not resolve.
    pub policy: UnresolvedPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            page_size: NonZeroU64::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU64::MIN),
            policy: UnresolvedPolicy::default(),
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every stage ran to completion. Per-record skips are allowed.
    Completed(RunSummary),
    /// A stage-fatal error stopped the run at `stage`.
    Aborted {
        stage: Stage,
        error: MigrationError,
        summary: RunSummary,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) => summary,
            RunOutcome::Aborted { summary, .. } => summary,
        }
    }
}

/// Drives the migration from the legacy source into the document store.
pub struct Orchestrator {
    reader: SourceReader,
    store: Arc<dyn DocumentStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn LegacySource>,
        store: Arc<dyn DocumentStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            reader: SourceReader::new(source, config.page_size),
            store,
            config,
        }
    }

    /// Runs every stage, then tears down both stores.
    ///
    /// Teardown happens on every path, including aborts. The returned outcome
    /// carries the summary of whatever was migrated before the run ended.
    #[instrument(skip_all, fields(page_size = self.reader.page_size(), policy = %self.config.policy))]
    pub async fn run(&self, log: &mut RunLog) -> RunOutcome {
        let started = Instant::now();
        log.info("Starting migration from the legacy store...");

        let mut maps = IdentityMaps::default();
        let mut stage = Stage::Accounts;
        let mut failure = None;

        while stage != Stage::Done {
            match self.run_stage(stage, &mut maps, log).await {
                Ok(()) => {
                    if let Some(kind) = stage.kind() {
                        log.record_stage_completed(kind);
                    }
                    stage = stage.next();
                }
                Err(error) => {
                    log.error(format!("Migration failed during {stage} stage: {error}"));
                    failure = Some(error);
                    break;
                }
            }
        }

        self.teardown(log).await;

        let summary = log.summary();
        report(&summary, log);
        log.info(format!(
            "Elapsed time: {:.2}s",
            started.elapsed().as_secs_f64()
        ));

        match failure {
            None => {
                log.success("Migration completed successfully!");
                RunOutcome::Completed(summary)
            }
            Some(error) => RunOutcome::Aborted {
                stage,
                error,
                summary,
            },
        }
    }

    async fn run_stage(
        &self,
        stage: Stage,
        maps: &mut IdentityMaps,
        log: &mut RunLog,
    ) -> Result<(), MigrationError> {
        let runner = StageRunner::new(&self.reader, self.store.as_ref(), self.config.policy);
        match stage {
            Stage::Accounts => runner.run(&AccountMigrator, maps, log).await,
            Stage::Categories => runner.run(&CategoryMigrator, maps, log).await,
            Stage::Sheets => runner.run(&SheetMigrator, maps, log).await,
            Stage::Transactions => runner.run(&TransactionMigrator, maps, log).await,
            Stage::Done => Ok(()),
        }
    }

    async fn teardown(&self, log: &mut RunLog) {
        self.reader.close().await;
        self.store.close().await;
        log.write_parked();
        log.info("Migration process finished.");
        info!("Store connections closed");
    }
}

fn report(summary: &RunSummary, log: &mut RunLog) {
    log.info("Migration summary:");
    log.info(stages_line(summary));
    for kind in EntityKind::ALL {
        let stage = summary.stage(kind);
        let mut line = format!(
            "  {kind}: migrated {}, skipped {}",
            stage.migrated,
            stage.skipped_total()
        );
        let reasons: Vec<String> = stage
            .skipped
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(reason, count)| format!("{} {count}", reason.as_str()))
            .collect();
        if !reasons.is_empty() {
            line.push_str(&format!(" ({})", reasons.join(", ")));
        }
        log.info(line);
    }
    if summary.parked > 0 {
        log.warning(format!(
            "{} records parked for manual review",
            summary.parked
        ));
    }
}

fn stages_line(summary: &RunSummary) -> String {
    let names: Vec<&str> = summary.completed.iter().map(|kind| kind.as_str()).collect();
    let mut line = format!(
        "  Stages completed: {}/{}",
        names.len(),
        EntityKind::ALL.len()
    );
    if !names.is_empty() {
        line.push_str(&format!(" ({})", names.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_follow_dependency_order() {
        let mut stage = Stage::Accounts;
        let mut kinds = Vec::new();
        while let Some(kind) = stage.kind() {
            kinds.push(kind);
            stage = stage.next();
        }

        assert_eq!(kinds, EntityKind::ALL.to_vec());
        assert_eq!(stage, Stage::Done);
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Sheets.to_string(), "sheets");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.page_size.get(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.policy, UnresolvedPolicy::Drop);
    }

    #[test]
    fn test_stages_line_lists_completed_stages() {
        let mut summary = RunSummary::default();
        assert_eq!(stages_line(&summary), "  Stages completed: 0/4");

        summary.completed = vec![EntityKind::Account, EntityKind::Category];
        assert_eq!(
            stages_line(&summary),
            "  Stages completed: 2/4 (accounts, categories)"
        );
    }
}
