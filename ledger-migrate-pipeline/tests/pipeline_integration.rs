//! Integration tests for the migration pipeline.
//!
//! These tests run the real Orchestrator against the in-memory legacy source
//! and document store, so every stage, reference rewrite and teardown path is
//! exercised without a database.

use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use ledger_migrate_pipeline::{
    BackfillOutcome, CategoryBackfill, LogLevel, MigrationError, Orchestrator, OrchestratorConfig,
    RunLog, RunOutcome, SkipReason, Stage, UnresolvedPolicy,
};
use ledger_migrate_repository::raw::{RawAccount, RawCategory, RawSheet, RawTransaction};
use ledger_migrate_repository::{MemoryDocumentStore, MemoryLegacySource, SourceError};
use ledger_migrate_shared::{EntityKind, TransactionKind};

fn at(minute: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap())
}

fn account(id: &str) -> RawAccount {
    RawAccount {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        full_name: Some(format!("User {id}")),
        created_at: at(0),
        updated_at: None,
    }
}

fn category(id: &str, label: &str, owner: Option<&str>) -> RawCategory {
    RawCategory {
        id: id.to_string(),
        label: Some(label.to_string()),
        user_id: owner.map(str::to_string),
        created_at: at(1),
        updated_at: None,
    }
}

fn sheet(id: &str, owner: &str) -> RawSheet {
    RawSheet {
        id: id.to_string(),
        name: Some(format!("Sheet {id}")),
        description: None,
        user_id: Some(owner.to_string()),
        created_at: at(2),
        updated_at: None,
    }
}

fn transaction(id: &str, amount: &str, sheet: &str, category: Option<&str>) -> RawTransaction {
    RawTransaction {
        id: id.to_string(),
        amount: Some(BigDecimal::from_str(amount).unwrap()),
        description: None,
        transaction_type: None,
        user_id: Some("u1".to_string()),
        record_sheet_id: Some(sheet.to_string()),
        category_id: category.map(str::to_string),
        created_at: at(3),
        updated_at: None,
    }
}

/// One account, one category, one sheet and two transactions, all linked.
fn scenario() -> MemoryLegacySource {
    MemoryLegacySource::new()
        .with_accounts(vec![account("u1")])
        .with_categories(vec![category("c1", "Groceries", Some("u1"))])
        .with_sheets(vec![sheet("s1", "u1")])
        .with_transactions(vec![
            transaction("t1", "500", "s1", Some("c1")),
            transaction("t2", "-200", "s1", Some("c1")),
        ])
}

fn config(policy: UnresolvedPolicy) -> OrchestratorConfig {
    OrchestratorConfig {
        policy,
        ..Default::default()
    }
}

async fn run(
    source: &Arc<MemoryLegacySource>,
    store: &Arc<MemoryDocumentStore>,
    config: OrchestratorConfig,
) -> (RunOutcome, RunLog) {
    let orchestrator = Orchestrator::new(source.clone(), store.clone(), config);
    let mut log = RunLog::new();
    let outcome = orchestrator.run(&mut log).await;
    (outcome, log)
}

#[tokio::test]
async fn test_scenario_migrates_every_entity() {
    let source = Arc::new(scenario());
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, _log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success(), "{outcome:?}");
    let summary = outcome.summary();
    for (kind, expected) in [
        (EntityKind::Account, 1),
        (EntityKind::Category, 1),
        (EntityKind::Sheet, 1),
        (EntityKind::Transaction, 2),
    ] {
        assert_eq!(summary.migrated(kind), expected, "{kind}");
        assert_eq!(summary.skipped(kind), 0, "{kind}");
        assert_eq!(store.count(kind), expected as usize, "{kind}");
    }
    assert_eq!(summary.completed, EntityKind::ALL.to_vec());

    let (account_id, account) = store.accounts()[0].clone();
    let (category_id, category) = store.categories()[0].clone();
    let (sheet_id, sheet) = store.sheets()[0].clone();

    assert_eq!(account.legacy_id, "u1");
    assert_eq!(account.email, "u1@example.com");
    assert!(account.credential.starts_with('!'));
    assert_eq!(category.owner_id, Some(account_id));
    assert_eq!(sheet.owner_id, account_id);

    let amounts: Vec<i64> = store.transactions().iter().map(|(_, t)| t.amount).collect();
    assert_eq!(amounts, vec![500, -200]);
    for (_, transaction) in store.transactions() {
        assert_eq!(transaction.owner_id, account_id);
        assert_eq!(transaction.sheet_id, sheet_id);
        assert_eq!(transaction.category_id, Some(category_id));
    }
}

#[tokio::test]
async fn test_unknown_sheet_is_skipped_with_warning() {
    let source = Arc::new(
        scenario().with_transactions(vec![
            transaction("t1", "500", "s1", None),
            transaction("t2", "700", "s9", None),
        ]),
    );
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success());
    let transactions = outcome.summary().stage(EntityKind::Transaction);
    assert_eq!(transactions.migrated, 1);
    assert_eq!(transactions.skipped_for(SkipReason::UnresolvedReference), 1);
    assert_eq!(store.count(EntityKind::Transaction), 1);
    assert!(log
        .entries_at(LogLevel::Warning)
        .any(|e| e.message.contains("t2") && e.message.contains("s9")));
}

#[tokio::test]
async fn test_sheet_with_unknown_owner_takes_its_transactions_with_it() {
    let source = Arc::new(scenario().with_sheets(vec![sheet("s1", "u9")]));
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success(), "{outcome:?}");
    let summary = outcome.summary();
    let sheets = summary.stage(EntityKind::Sheet);
    assert_eq!(sheets.migrated, 0);
    assert_eq!(sheets.skipped_for(SkipReason::UnresolvedReference), 1);
    let transactions = summary.stage(EntityKind::Transaction);
    assert_eq!(transactions.migrated, 0);
    assert_eq!(transactions.skipped_for(SkipReason::UnresolvedReference), 2);

    assert_eq!(store.count(EntityKind::Account), 1);
    assert_eq!(store.count(EntityKind::Sheet), 0);
    assert_eq!(store.count(EntityKind::Transaction), 0);
    assert!(log
        .entries_at(LogLevel::Warning)
        .any(|e| e.message.contains("s1") && e.message.contains("u9")));
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let source = Arc::new(scenario());
    let store = Arc::new(MemoryDocumentStore::new());

    let (first, _) = run(&source, &store, OrchestratorConfig::default()).await;
    assert!(first.is_success());
    let writes = store.writes();

    source.reopen();
    store.reopen();
    let (second, _) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(second.is_success());
    assert_eq!(store.writes(), writes);
    for kind in EntityKind::ALL {
        let stage = second.summary().stage(kind);
        assert_eq!(stage.migrated, 0, "{kind}");
        assert_eq!(
            stage.skipped_for(SkipReason::AlreadyPresent),
            first.summary().migrated(kind),
            "{kind}"
        );
    }
}

#[tokio::test]
async fn test_stages_read_in_dependency_order() {
    let source = Arc::new(scenario());
    let store = Arc::new(MemoryDocumentStore::new());

    run(&source, &store, OrchestratorConfig::default()).await;

    let kinds: Vec<EntityKind> = source.reads().into_iter().map(|(kind, _)| kind).collect();
    assert!(kinds.windows(2).all(|pair| pair[0] <= pair[1]), "{kinds:?}");
    for kind in EntityKind::ALL {
        assert!(kinds.contains(&kind), "{kind} never read");
    }
}

#[tokio::test]
async fn test_defaults_are_substituted() {
    let source = Arc::new(
        scenario()
            .with_categories(vec![category("c0", "General", None)])
            .with_transactions(vec![transaction("t1", "500", "s1", None)]),
    );
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, _) = run(&source, &store, OrchestratorConfig::default()).await;
    assert!(outcome.is_success());

    let (_, category) = store.categories()[0].clone();
    assert_eq!(category.owner_id, None);

    let (_, sheet) = store.sheets()[0].clone();
    assert_eq!(sheet.description, "");
    assert_eq!(sheet.updated_at, sheet.created_at);

    let (_, transaction) = store.transactions()[0].clone();
    assert_eq!(transaction.kind, TransactionKind::Expense);
    assert_eq!(transaction.description, "");
    assert_eq!(transaction.category_id, None);
    assert_eq!(transaction.created_at, at(3).unwrap());
}

#[tokio::test]
async fn test_pages_through_every_entity_type() {
    let accounts: Vec<RawAccount> = (1..=5).map(|i| account(&format!("u{i}"))).collect();
    let source = Arc::new(scenario().with_accounts(accounts));
    let store = Arc::new(MemoryDocumentStore::new());
    let config = OrchestratorConfig {
        page_size: NonZeroU64::new(2).unwrap(),
        ..Default::default()
    };

    let (outcome, log) = run(&source, &store, config).await;

    assert!(outcome.is_success());
    assert_eq!(store.count(EntityKind::Account), 5);

    let account_offsets: Vec<u64> = source
        .reads()
        .into_iter()
        .filter(|(kind, _)| *kind == EntityKind::Account)
        .map(|(_, window)| window.offset)
        .collect();
    assert_eq!(account_offsets, vec![0, 2, 4]);

    // Two transactions fill a page exactly, so a trailing empty page is read.
    let transaction_reads = source
        .reads()
        .into_iter()
        .filter(|(kind, window)| *kind == EntityKind::Transaction && window.limit == 2)
        .count();
    assert_eq!(transaction_reads, 2);

    assert!(log
        .entries()
        .iter()
        .any(|e| e.message == "Processing batch of 1 accounts (4 to 4)"));
}

#[tokio::test]
async fn test_source_failure_aborts_and_tears_down() {
    let source = Arc::new(scenario());
    source.fail_reads_for(EntityKind::Sheet);
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    match &outcome {
        RunOutcome::Aborted { stage, error, summary } => {
            assert_eq!(*stage, Stage::Sheets);
            assert!(matches!(error, MigrationError::Source(SourceError::Unavailable { .. })));
            assert_eq!(summary.completed, vec![EntityKind::Account, EntityKind::Category]);
        }
        other => panic!("expected an aborted run, got {other:?}"),
    }

    assert!(source.is_closed());
    assert!(store.is_closed());
    assert_eq!(store.count(EntityKind::Account), 1);
    assert_eq!(store.count(EntityKind::Category), 1);
    assert!(source
        .reads()
        .iter()
        .all(|(kind, _)| *kind != EntityKind::Transaction));

    let errors: Vec<_> = log.entries_at(LogLevel::Error).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("sheets"));
    assert!(log
        .entries()
        .iter()
        .any(|e| e.message == "Migration process finished."));
    assert!(log
        .entries()
        .iter()
        .any(|e| e.message == "  Stages completed: 2/4 (accounts, categories)"));
}

#[tokio::test]
async fn test_store_failure_aborts_stage() {
    let source = Arc::new(scenario().with_accounts(vec![account("u1"), account("u2")]));
    let store = Arc::new(MemoryDocumentStore::new().unavailable_after(1));

    let (outcome, _) = run(&source, &store, OrchestratorConfig::default()).await;

    match &outcome {
        RunOutcome::Aborted { stage, error, summary } => {
            assert_eq!(*stage, Stage::Accounts);
            assert!(matches!(error, MigrationError::Store(e) if e.is_fatal()));
            assert_eq!(summary.migrated(EntityKind::Account), 1);
            assert!(summary.completed.is_empty());
        }
        other => panic!("expected an aborted run, got {other:?}"),
    }
    assert!(store.is_closed());
    assert_eq!(store.count(EntityKind::Account), 1);
    assert_eq!(store.count(EntityKind::Category), 0);
}

#[tokio::test]
async fn test_park_policy_sets_records_aside() {
    let source = Arc::new(
        scenario().with_categories(vec![
            category("c1", "Groceries", Some("u1")),
            category("c9", "Orphan", Some("u9")),
        ]),
    );
    let store = Arc::new(MemoryDocumentStore::new());
    let dir = std::env::temp_dir().join(format!("ledger-migrate-{}", uuid::Uuid::new_v4()));

    let orchestrator = Orchestrator::new(
        source.clone(),
        store.clone(),
        config(UnresolvedPolicy::Park),
    );
    let mut log = RunLog::with_file(&dir, "migration");
    let outcome = orchestrator.run(&mut log).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.summary().parked, 1);
    assert_eq!(log.parked().len(), 1);
    assert_eq!(log.parked()[0].kind, EntityKind::Category);
    assert_eq!(log.parked()[0].legacy_id, "c9");
    // Never promoted to a shared category.
    assert_eq!(store.count(EntityKind::Category), 1);

    let parked_files: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("parked-"))
        .collect();
    assert_eq!(parked_files.len(), 1);
    let contents = std::fs::read_to_string(parked_files[0].path()).unwrap();
    assert!(contents.contains("\"legacy_id\":\"c9\""));

    log.close();
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_fail_policy_aborts_on_unresolved_reference() {
    let source = Arc::new(
        scenario().with_transactions(vec![transaction("t1", "500", "s9", None)]),
    );
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, _) = run(&source, &store, config(UnresolvedPolicy::Fail)).await;

    match &outcome {
        RunOutcome::Aborted { stage, error, .. } => {
            assert_eq!(*stage, Stage::Transactions);
            assert!(matches!(
                error,
                MigrationError::UnresolvedReference { kind: EntityKind::Transaction, legacy_id, .. }
                    if legacy_id == "t1"
            ));
        }
        other => panic!("expected an aborted run, got {other:?}"),
    }
    assert!(source.is_closed());
    assert_eq!(store.count(EntityKind::Sheet), 1);
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let source = Arc::new(scenario().with_transactions(vec![
        transaction("t1", "12.50", "s1", None),
        transaction("t2", "500", "s1", None),
    ]));
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success());
    let transactions = outcome.summary().stage(EntityKind::Transaction);
    assert_eq!(transactions.migrated, 1);
    assert_eq!(transactions.skipped_for(SkipReason::Malformed), 1);
    assert!(log
        .entries_at(LogLevel::Error)
        .any(|e| e.message.contains("t1")));
}

#[tokio::test]
async fn test_rejected_write_does_not_stop_the_stage() {
    let source = Arc::new(scenario());
    let store = Arc::new(MemoryDocumentStore::new().rejecting("t1"));

    let (outcome, _) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success());
    let transactions = outcome.summary().stage(EntityKind::Transaction);
    assert_eq!(transactions.migrated, 1);
    assert_eq!(transactions.skipped_for(SkipReason::WriteFailed), 1);
    assert_eq!(store.transactions()[0].1.legacy_id, "t2");
}

#[tokio::test]
async fn test_conflicting_write_counts_as_already_present() {
    let source = Arc::new(scenario());
    let store = Arc::new(MemoryDocumentStore::new().racing("s1"));

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success(), "{outcome:?}");
    let sheets = outcome.summary().stage(EntityKind::Sheet);
    assert_eq!(sheets.migrated, 0);
    assert_eq!(sheets.skipped_for(SkipReason::AlreadyPresent), 1);
    assert_eq!(sheets.skipped_for(SkipReason::WriteFailed), 0);
    assert_eq!(store.count(EntityKind::Sheet), 1);

    let sheet_id = store.sheets()[0].0;
    assert_eq!(outcome.summary().migrated(EntityKind::Transaction), 2);
    for (_, transaction) in store.transactions() {
        assert_eq!(transaction.sheet_id, sheet_id);
    }
    assert_eq!(log.entries_at(LogLevel::Error).count(), 0);
}

#[tokio::test]
async fn test_unknown_category_is_dropped_not_skipped() {
    let source = Arc::new(
        scenario().with_transactions(vec![transaction("t1", "500", "s1", Some("c9"))]),
    );
    let store = Arc::new(MemoryDocumentStore::new());

    let (outcome, log) = run(&source, &store, OrchestratorConfig::default()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.summary().migrated(EntityKind::Transaction), 1);
    assert_eq!(store.transactions()[0].1.category_id, None);
    assert!(log
        .entries_at(LogLevel::Warning)
        .any(|e| e.message.contains("c9")));
}

#[tokio::test]
async fn test_backfill_assigns_first_shared_category() {
    let source = Arc::new(
        scenario()
            .with_categories(vec![
                category("c0", "General", None),
                category("c1", "Groceries", Some("u1")),
            ])
            .with_transactions(vec![
                transaction("t1", "500", "s1", None),
                transaction("t2", "-200", "s1", Some("c1")),
            ]),
    );
    let store = Arc::new(MemoryDocumentStore::new());
    let (outcome, _) = run(&source, &store, OrchestratorConfig::default()).await;
    assert!(outcome.is_success());
    store.reopen();

    let shared_id = store
        .categories()
        .into_iter()
        .find(|(_, c)| c.owner_id.is_none())
        .map(|(id, _)| id)
        .unwrap();

    let mut log = RunLog::new();
    let backfill = CategoryBackfill::new(store.clone());
    let result = backfill.run(&mut log).await.unwrap();

    match result {
        BackfillOutcome::Updated {
            category,
            transactions,
        } => {
            assert_eq!(category.id, shared_id);
            assert_eq!(category.label, "General");
            assert_eq!(transactions, 1);
        }
        other => panic!("expected an update, got {other:?}"),
    }
    assert!(store
        .transactions()
        .iter()
        .all(|(_, t)| t.category_id.is_some()));
}

#[tokio::test]
async fn test_backfill_without_shared_category() {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut log = RunLog::new();

    let result = CategoryBackfill::new(store.clone()).run(&mut log).await.unwrap();

    assert_eq!(result, BackfillOutcome::NoSharedCategory);
    assert_eq!(log.entries_at(LogLevel::Error).count(), 1);
}
