//! Check operation: re-hash stored files and compare digests.

use std::path::Path;

use serde::Serialize;

use crate::output::{FolderTracker, Level};
use crate::scanner::HashError;
use crate::store::PathFilter;

use super::context::RunContext;
use super::RunError;

/// Outcome of verifying the records under a root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Records whose file still hashes to the stored digest
    pub ok: usize,
    /// Paths whose content changed
    pub mismatched: Vec<String>,
    /// Paths recorded but no longer on disk
    pub missing: Vec<String>,
    /// Paths that exist but could not be read
    pub failed: Vec<String>,
}

impl CheckReport {
    /// Whether every record verified.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty() && self.failed.is_empty()
    }
}

/// Verify every record at or beneath `root`. Never mutates the store.
///
/// # Errors
///
/// Fails on a store query error or shutdown.
pub fn check(ctx: &mut RunContext, root: &Path) -> Result<CheckReport, RunError> {
    let records = ctx.store().query(&PathFilter::for_root(root))?;
    log::debug!("Checking {} records under {}", records.len(), root.display());

    let mut report = CheckReport::default();
    let mut folders = FolderTracker::new();

    for record in &records {
        ctx.check_cancelled()?;
        let key = record.path.as_str();
        if let Some(dir) = folders.enter(key) {
            ctx.emit(Level::Progress, format!("Processing folder {}", dir));
        }
        ctx.emit(Level::Detail, format!("Checking {}", key));

        let path = Path::new(key);
        if !path.is_file() {
            ctx.emit(Level::Outcome, format!("File missing: {}", key));
            report.missing.push(record.path.clone());
            continue;
        }

        match ctx.hash_for_check(path) {
            Ok(hashed) if hashed.matches_hex(&record.content_hash) => {
                ctx.emit(Level::Detail, format!("Hash OK for {}", key));
                report.ok += 1;
            }
            Ok(_) => {
                ctx.emit(Level::Outcome, format!("Hash mismatch for {}", key));
                report.mismatched.push(record.path.clone());
            }
            Err(HashError::Interrupted(_)) => return Err(RunError::Interrupted),
            Err(HashError::NotFound(_)) => {
                ctx.emit(Level::Outcome, format!("File missing: {}", key));
                report.missing.push(record.path.clone());
            }
            Err(e) => {
                log::warn!("{}", e);
                ctx.emit(Level::Outcome, format!("Unable to open file {}", key));
                report.failed.push(record.path.clone());
            }
        }
    }

    log::info!(
        "Check finished: {} ok, {} mismatched, {} missing, {} unreadable",
        report.ok,
        report.mismatched.len(),
        report.missing.len(),
        report.failed.len()
    );
    Ok(report)
}
