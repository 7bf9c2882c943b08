//! Generate operation: hash new files and, optionally, refresh changed ones.
//!
//! # Overview
//!
//! The candidate list is either the "new" side of the diff (files on disk
//! without a record) or, in update mode, every file under the root. The
//! [`UpdateEngine`] then decides per path:
//!
//! 1. No record: hash and insert.
//! 2. Record and update mode: re-hash and rewrite the record when the
//!    digest changed.
//! 3. Record without update mode: nothing to do.
//! 4. File gone by the time it is hashed: report it and move on.
//!
//! In dry-run mode new files are not hashed at all, while update mode still
//! hashes to report what would change.

use std::path::Path;

use serde::Serialize;

use crate::output::{FolderTracker, Level};
use crate::scanner::HashError;
use crate::store::HashRecord;

use super::context::RunContext;
use super::diff::{DiffKind, Reconciler};
use super::policy::Mutation;
use super::RunError;

/// Counters for one generate run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateReport {
    /// New records inserted
    pub inserted: usize,
    /// Existing records rewritten with a new digest
    pub updated: usize,
    /// Existing records whose digest still matched (or were not re-checked)
    pub unchanged: usize,
    /// Inserts or updates suppressed by dry-run
    pub skipped: usize,
    /// Files that could not be read
    pub failed: usize,
    /// Candidates that vanished before they were hashed
    pub deleted_on_disk: usize,
}

/// Per-path insert/update decisions for one session.
#[derive(Debug, Clone, Copy)]
pub struct UpdateEngine {
    session: i64,
    update: bool,
}

impl UpdateEngine {
    /// Engine stamping records with `session`; `update` enables re-hashing
    /// of known paths.
    #[must_use]
    pub fn new(session: i64, update: bool) -> Self {
        Self { session, update }
    }

    /// Process `candidates` in order.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Interrupted`] on shutdown and [`RunError::Store`]
    /// if the working copy rejects a write. Per-file read errors are
    /// reported and counted instead.
    pub fn run(
        &self,
        ctx: &mut RunContext,
        candidates: &[String],
    ) -> Result<GenerateReport, RunError> {
        let mut report = GenerateReport::default();
        let mut folders = FolderTracker::new();

        for key in candidates {
            ctx.check_cancelled()?;
            ctx.maybe_checkpoint()?;
            if let Some(dir) = folders.enter(key) {
                ctx.emit(Level::Notice, format!("Processing folder {}", dir));
            }
            self.process(ctx, key, &mut report)?;
        }

        log::info!(
            "Generate finished: {} inserted, {} updated, {} unchanged, {} skipped, {} failed",
            report.inserted,
            report.updated,
            report.unchanged,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    fn process(
        &self,
        ctx: &mut RunContext,
        key: &str,
        report: &mut GenerateReport,
    ) -> Result<(), RunError> {
        match ctx.store().get(key)? {
            None => self.insert_new(ctx, key, report),
            Some(existing) if self.update => self.refresh(ctx, &existing, report),
            Some(_) => {
                report.unchanged += 1;
                Ok(())
            }
        }
    }

    fn insert_new(
        &self,
        ctx: &mut RunContext,
        key: &str,
        report: &mut GenerateReport,
    ) -> Result<(), RunError> {
        if ctx.is_dry_run() {
            ctx.emit(Level::Outcome, format!("Hashing skipped {}", key));
            report.skipped += 1;
            return Ok(());
        }

        ctx.emit(Level::Progress, format!("Hashing {}", key));
        let path = Path::new(key);
        if !path.is_file() {
            ctx.emit(Level::Outcome, format!("File was deleted: {}", key));
            report.deleted_on_disk += 1;
            return Ok(());
        }

        match ctx.hash_for_record(path) {
            Ok(hashed) => {
                let record = HashRecord::from_hashed(key, &hashed, self.session);
                if ctx.insert(&record)? == Mutation::Applied {
                    report.inserted += 1;
                }
                Ok(())
            }
            Err(e) => hash_failed(ctx, key, e, report),
        }
    }

    fn refresh(
        &self,
        ctx: &mut RunContext,
        existing: &HashRecord,
        report: &mut GenerateReport,
    ) -> Result<(), RunError> {
        let key = existing.path.as_str();
        let path = Path::new(key);
        if !path.is_file() {
            ctx.emit(Level::Outcome, format!("File was deleted: {}", key));
            report.deleted_on_disk += 1;
            return Ok(());
        }

        let hashed = match ctx.hash_for_record(path) {
            Ok(hashed) => hashed,
            Err(e) => return hash_failed(ctx, key, e, report),
        };

        if hashed.matches_hex(&existing.content_hash) {
            ctx.emit(Level::Progress, format!("Hash already correct: {}", key));
            report.unchanged += 1;
            return Ok(());
        }

        let record = HashRecord::from_hashed(key, &hashed, self.session);
        match ctx.update(&record)? {
            Mutation::Applied => {
                ctx.emit(Level::Outcome, format!("Updating file {}", key));
                report.updated += 1;
            }
            Mutation::Suppressed => {
                ctx.emit(Level::Outcome, format!("Update skipped: {}", key));
                report.skipped += 1;
            }
        }
        Ok(())
    }
}

fn hash_failed(
    ctx: &mut RunContext,
    key: &str,
    error: HashError,
    report: &mut GenerateReport,
) -> Result<(), RunError> {
    match error {
        HashError::Interrupted(_) => Err(RunError::Interrupted),
        HashError::NotFound(_) => {
            ctx.emit(Level::Outcome, format!("File was deleted: {}", key));
            report.deleted_on_disk += 1;
            Ok(())
        }
        other => {
            log::warn!("{}", other);
            ctx.emit(Level::Outcome, format!("Unable to open file {}", key));
            report.failed += 1;
            Ok(())
        }
    }
}

/// Hash new files under `root` (all files in update mode) into the store.
///
/// # Errors
///
/// Fails on an invalid root, a store failure or shutdown.
pub fn generate(
    ctx: &mut RunContext,
    root: &Path,
    recursive: bool,
    update: bool,
    session: i64,
) -> Result<GenerateReport, RunError> {
    let candidates = if update {
        ctx.list(root, recursive)?
    } else {
        Reconciler::diff(ctx, root, recursive, DiffKind::New)?
    };
    log::debug!("{} candidate files under {}", candidates.len(), root.display());
    UpdateEngine::new(session, update).run(ctx, &candidates)
}
