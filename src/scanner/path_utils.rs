//! Path utilities for stored keys.
//!
//! Stored paths are plain strings compared by exact equality. This module
//! turns user-supplied roots into absolute, lexically normalized paths
//! (like an `abspath`: `.` dropped, `..` folded, trailing separators
//! removed) so that keys built on different runs line up. No case folding
//! or Unicode normalization is applied.
//!
//! # Example
//!
//! ```
//! use hashkeeper::scanner::path_utils::normalize_lexically;
//! use std::path::{Path, PathBuf};
//!
//! assert_eq!(
//!     normalize_lexically(Path::new("/data/./photos/../docs/")),
//!     PathBuf::from("/data/docs")
//! );
//! ```

use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Make `path` absolute against the current directory and normalize it.
///
/// Symlinks are not resolved.
///
/// # Errors
///
/// Fails if the path is empty or the current directory cannot be read.
pub fn absolute_normalized(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    Ok(normalize_lexically(&absolute))
}

/// Fold `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root or a prefix.
                if matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// String form used as the store key for a path.
///
/// Non-UTF-8 bytes are replaced lossily.
#[must_use]
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parent directory of a stored key, for "Processing folder" notices.
#[must_use]
pub fn parent_key(key: &str) -> String {
    Path::new(key)
        .parent()
        .map(path_key)
        .unwrap_or_default()
}

/// `dir` with exactly one trailing native separator.
#[must_use]
pub fn with_trailing_separator(dir: &str) -> String {
    if dir.ends_with(MAIN_SEPARATOR) {
        dir.to_string()
    } else {
        format!("{dir}{MAIN_SEPARATOR}")
    }
}

/// Whether `inner` is `outer` itself or lies beneath it (component-wise).
#[must_use]
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    inner.starts_with(outer)
}
