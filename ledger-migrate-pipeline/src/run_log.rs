//! Append-only log of a migration run.
//!
//! Every entry is kept in memory for the final summary, emitted through
//! `tracing`, and optionally appended to a per-run file under the log
//! directory (`migration-<timestamp>.log`). The file sink is best effort: the
//! first write failure is reported and the sink is dropped, the run goes on.
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use ledger_migrate_shared::{EntityKind, LegacyId};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    /// The line written to the log file.
    pub fn line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.level.as_str(),
            self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.message
        )
    }
}

/// Why a legacy record did not produce a new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyPresent,
    UnresolvedReference,
    Malformed,
    WriteFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyPresent => "already present",
            SkipReason::UnresolvedReference => "unresolved reference",
            SkipReason::Malformed => "malformed",
            SkipReason::WriteFailed => "write failed",
        }
    }
}

/// Counts for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub migrated: u64,
    pub skipped: BTreeMap<SkipReason, u64>,
}

impl StageSummary {
    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Records processed by the stage, migrated or not.
    pub fn processed(&self) -> u64 {
        self.migrated + self.skipped_total()
    }
}

/// A record set aside for manual review because a reference did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkedRecord {
    pub kind: EntityKind,
    pub legacy_id: LegacyId,
    pub reason: String,
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub stages: BTreeMap<EntityKind, StageSummary>,
    /// Stages that ran to completion, in the order they finished.
    pub completed: Vec<EntityKind>,
    pub parked: usize,
}

impl RunSummary {
    /// Summary for `kind`; empty when the stage never ran.
    pub fn stage(&self, kind: EntityKind) -> StageSummary {
        self.stages.get(&kind).cloned().unwrap_or_default()
    }

    pub fn migrated(&self, kind: EntityKind) -> u64 {
        self.stage(kind).migrated
    }

    pub fn skipped(&self, kind: EntityKind) -> u64 {
        self.stage(kind).skipped_total()
    }

    pub fn is_complete(&self, kind: EntityKind) -> bool {
        self.completed.contains(&kind)
    }
}

struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// The run log. See the module documentation.
pub struct RunLog {
    entries: Vec<LogEntry>,
    stages: BTreeMap<EntityKind, StageSummary>,
    completed: Vec<EntityKind>,
    parked: Vec<ParkedRecord>,
    dir: Option<PathBuf>,
    sink: Option<FileSink>,
    started_at: DateTime<Utc>,
}

impl RunLog {
    /// A log that only keeps entries in memory and emits them through tracing.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            stages: BTreeMap::new(),
            completed: Vec::new(),
            parked: Vec::new(),
            dir: None,
            sink: None,
            started_at: Utc::now(),
        }
    }

    /// A log that also appends every entry to `dir/<prefix>-<timestamp>.log`.
    ///
    /// When the directory or file cannot be created the failure is reported
    /// and the log falls back to memory and tracing only.
    pub fn with_file(dir: impl AsRef<Path>, prefix: &str) -> Self {
        let mut log = Self::new();
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(format!("{prefix}-{}.log", log.file_stamp()));

        match open_append(&dir, &path) {
            Ok(file) => {
                log.sink = Some(FileSink {
                    path,
                    writer: BufWriter::new(file),
                });
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Run log file unavailable"),
        }
        log.dir = Some(dir);
        log
    }

    /// Path of the log file, when one is being written.
    pub fn file_path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_at(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    pub fn record_migrated(&mut self, kind: EntityKind) {
        self.stages.entry(kind).or_default().migrated += 1;
    }

    pub fn record_skipped(&mut self, kind: EntityKind, reason: SkipReason) {
        *self
            .stages
            .entry(kind)
            .or_default()
            .skipped
            .entry(reason)
            .or_insert(0) += 1;
    }

    pub fn record_stage_completed(&mut self, kind: EntityKind) {
        if !self.completed.contains(&kind) {
            self.completed.push(kind);
        }
    }

    pub fn park(&mut self, record: ParkedRecord) {
        self.parked.push(record);
    }

    pub fn parked(&self) -> &[ParkedRecord] {
        &self.parked
    }

    pub fn stage(&self, kind: EntityKind) -> StageSummary {
        self.stages.get(&kind).cloned().unwrap_or_default()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            stages: self.stages.clone(),
            completed: self.completed.clone(),
            parked: self.parked.len(),
        }
    }

    /// Writes parked records as JSON lines next to the log file.
    ///
    /// Returns the path written, or `None` when there is nothing to write or
    /// no log directory was configured.
    pub fn write_parked(&mut self) -> Option<PathBuf> {
        if self.parked.is_empty() {
            return None;
        }
        let dir = self.dir.clone()?;
        let path = dir.join(format!("parked-{}.jsonl", self.file_stamp()));

        let written = open_append(&dir, &path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            for record in &self.parked {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()
        });

        match written {
            Ok(()) => {
                self.info(format!(
                    "Wrote {} parked records to {}",
                    self.parked.len(),
                    path.display()
                ));
                Some(path)
            }
            Err(e) => {
                self.error(format!("Failed to write parked records: {e}"));
                None
            }
        }
    }

    /// Flushes and closes the file sink.
    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.writer.flush() {
                warn!(path = %sink.path.display(), error = %e, "Failed to flush run log");
            }
        }
    }

    fn file_stamp(&self) -> String {
        self.started_at
            .format("%Y-%m-%dT%H-%M-%S%.3fZ")
            .to_string()
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Success => info!(outcome = "success", "{message}"),
            LogLevel::Warning => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }

        let entry = LogEntry {
            level,
            at: Utc::now(),
            message,
        };

        if let Some(sink) = self.sink.as_mut() {
            let written = writeln!(sink.writer, "{}", entry.line()).and_then(|_| sink.writer.flush());
            if let Err(e) = written {
                warn!(path = %sink.path.display(), error = %e, "Run log file write failed, continuing without it");
                self.sink = None;
            }
        }

        self.entries.push(entry);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_append(dir: &Path, path: &Path) -> std::io::Result<File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new().create(true).append(true).open(path)
}
