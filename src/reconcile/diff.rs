//! Set difference between the filesystem and the store.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::output::Level;

use super::context::RunContext;
use super::RunError;

/// Which side of the difference to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// On disk, not in the store.
    New,
    /// In the store, not on disk.
    Missing,
}

impl DiffKind {
    fn label(self) -> &'static str {
        match self {
            Self::New => "New file",
            Self::Missing => "File missing",
        }
    }
}

/// `filesystem - stored` or `stored - filesystem`, ascending.
///
/// Membership is exact string equality: no case folding and no Unicode
/// normalization.
#[must_use]
pub fn difference(
    filesystem: &BTreeSet<String>,
    stored: &BTreeSet<String>,
    kind: DiffKind,
) -> Vec<String> {
    match kind {
        DiffKind::New => filesystem.difference(stored).cloned().collect(),
        DiffKind::Missing => stored.difference(filesystem).cloned().collect(),
    }
}

/// Compares the tree under a root with the records beneath it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Compute the difference of `kind` under `root`.
    ///
    /// Stored paths are always selected recursively, so a missing-file diff
    /// must also walk recursively or every nested record reads as missing.
    /// [`Reconciler::enumerate`] enforces that for [`DiffKind::Missing`].
    ///
    /// # Errors
    ///
    /// Fails if the root is invalid, the store query fails, or shutdown
    /// was requested during the walk.
    pub fn diff(
        ctx: &mut RunContext,
        root: &Path,
        recursive: bool,
        kind: DiffKind,
    ) -> Result<Vec<String>, RunError> {
        ctx.diff(root, recursive, kind)
    }

    /// Report every path in the difference, one message each.
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::diff`].
    pub fn enumerate(
        ctx: &mut RunContext,
        root: &Path,
        recursive: bool,
        kind: DiffKind,
    ) -> Result<Vec<String>, RunError> {
        let recursive = recursive || kind == DiffKind::Missing;
        let paths = Self::diff(ctx, root, recursive, kind)?;
        for path in &paths {
            ctx.emit(Level::Outcome, format!("{}: {}", kind.label(), path));
        }
        Ok(paths)
    }
}
