//! # Ledger Migrate Pipeline
//! The staged migration from the legacy store into the new document store.
//!
//! Stages run in a fixed order (accounts, categories, sheets, transactions)
//! because every later entity points at earlier ones. Each stage fills an
//! identity map from legacy ids to new ids that the following stages use to
//! rewrite their foreign keys. Re-running the whole pipeline is always safe:
//! documents that already carry a legacy id are skipped.
pub mod backfill;
pub mod errors;
pub mod identity;
pub mod migrator;
pub mod orchestrator;
pub mod reader;
pub mod run_log;

pub use backfill::{BackfillOutcome, CategoryBackfill};
pub use errors::{InvalidPolicy, MigrationError};
pub use identity::{IdentityMap, IdentityMaps};
pub use migrator::UnresolvedPolicy;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, Stage};
pub use reader::SourceReader;
pub use run_log::{LogEntry, LogLevel, ParkedRecord, RunLog, RunSummary, SkipReason, StageSummary};
