//! Path filters selecting which stored records an operation touches.

use std::path::Path;

use crate::scanner::path_utils::{path_key, with_trailing_separator};

/// Selects stored records by path.
///
/// Matching is exact string comparison; there is no `LIKE` wildcard
/// expansion and no case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilter {
    /// Only the record whose path equals the string.
    Exact(String),
    /// The path itself and every record beneath it as a directory.
    Beneath(String),
}

impl PathFilter {
    /// Filter for an operation rooted at `root`.
    ///
    /// An existing file matches exactly. An existing directory, or a path
    /// that no longer exists (so a deleted file or directory can still be
    /// checked or pruned), matches itself and everything beneath it.
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        let key = path_key(root);
        if root.is_file() {
            Self::Exact(key)
        } else {
            Self::Beneath(key)
        }
    }

    /// SQL predicate over the `filename` column plus its bound parameters.
    pub(crate) fn sql(&self) -> (&'static str, Vec<String>) {
        match self {
            Self::Exact(path) => ("filename = ?1", vec![path.clone()]),
            Self::Beneath(dir) => {
                let prefix = with_trailing_separator(dir);
                let len = prefix.chars().count().to_string();
                (
                    "(filename = ?1 OR substr(filename, 1, CAST(?3 AS INTEGER)) = ?2)",
                    vec![dir.clone(), prefix, len],
                )
            }
        }
    }

    /// Same predicate evaluated in memory.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Beneath(dir) => path == dir || path.starts_with(&with_trailing_separator(dir)),
        }
    }
}
