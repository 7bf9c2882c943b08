//! Prune operation: drop records whose files are gone.

use std::path::Path;

use serde::Serialize;

use crate::output::Level;
use crate::store::PathFilter;

use super::context::RunContext;
use super::diff::{DiffKind, Reconciler};
use super::policy::Mutation;
use super::RunError;

/// Outcome of a prune run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Records deleted from the working copy
    pub pruned: Vec<String>,
    /// Deletions suppressed by dry-run
    pub skipped: Vec<String>,
    /// Candidates that turned out to still exist
    pub retained: usize,
}

/// Delete every record at or beneath `root` whose file no longer exists.
///
/// An existing root is walked recursively and diffed against the store.
/// A root that no longer exists selects its records directly, so a
/// deleted directory can be pruned as a whole.
///
/// # Errors
///
/// Fails on a store error or shutdown.
pub fn prune(ctx: &mut RunContext, root: &Path) -> Result<PruneReport, RunError> {
    let candidates = if root.exists() {
        Reconciler::diff(ctx, root, true, DiffKind::Missing)?
    } else {
        log::debug!("{} does not exist, selecting stored records", root.display());
        ctx.store().query_paths(&PathFilter::for_root(root))?
    };

    let mut report = PruneReport::default();
    for key in candidates {
        ctx.check_cancelled()?;
        ctx.maybe_checkpoint()?;

        if Path::new(&key).is_file() {
            log::debug!("Keeping {}: file exists", key);
            report.retained += 1;
            continue;
        }

        match ctx.delete(&key)? {
            Mutation::Applied => {
                ctx.emit(Level::Outcome, format!("Deleting file entry {}", key));
                report.pruned.push(key);
            }
            Mutation::Suppressed => {
                ctx.emit(Level::Outcome, format!("Skipped deleting entry {}", key));
                report.skipped.push(key);
            }
        }
    }

    log::info!(
        "Prune finished: {} pruned, {} skipped",
        report.pruned.len(),
        report.skipped.len()
    );
    Ok(report)
}
