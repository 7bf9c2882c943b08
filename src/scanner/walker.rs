//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for listing the candidate
//! files under a root. Traversal is sequential and sorted by file name
//! within each directory, so the same tree always yields the same order.
//!
//! A root that is a single file yields just that file. A root that is
//! neither a file nor a directory is fatal ([`ScanError::InvalidPath`]).
//! Errors below the root (an unreadable subdirectory, an entry that
//! disappears mid-walk) are logged and skipped. An unreadable root is
//! fatal ([`ScanError::Io`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use hashkeeper::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/data"), true);
//! for path in walker.list().unwrap() {
//!     println!("{}", path.display());
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::ScanError;

/// Lists files under a root, optionally recursing into subdirectories.
///
/// Directories and symlinks to directories are never returned. Symlinks
/// to files are returned as the link path, since the store keys files by
/// the path they were found under.
///
/// # Thread Safety
///
/// The walk runs on the calling thread. The shutdown flag may be set from
/// any thread and is checked before each entry.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Descend below the immediate directory
    recursive: bool,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `root` - File or directory to list
    /// * `recursive` - Descend into subdirectories; `false` lists one level
    #[must_use]
    pub fn new(root: &Path, recursive: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walk stops early and returns
    /// whatever was collected so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// List every candidate file in traversal order.
    ///
    /// # Returns
    ///
    /// The files found, sorted by name within each directory. A walk
    /// stopped by the shutdown flag returns what it collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPath`] if the root is neither an
    /// existing file nor an existing directory, and [`ScanError::Io`] if
    /// the root exists but cannot be inspected or read.
    pub fn list(&self) -> Result<Vec<PathBuf>, ScanError> {
        let metadata = match fs::metadata(&self.root) {
            Ok(metadata) => metadata,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                log::debug!("Root does not exist: {}", self.root.display());
                return Err(ScanError::InvalidPath(self.root.clone()));
            }
            Err(e) => return Err(self.root_error(e)),
        };
        if metadata.is_file() {
            return Ok(vec![self.root.clone()]);
        }
        if !metadata.is_dir() {
            log::debug!("Root is neither file nor directory: {}", self.root.display());
            return Err(ScanError::InvalidPath(self.root.clone()));
        }

        let mut walk = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !self.recursive {
            walk = walk.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walk {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(self.root_error(e.into())),
                Err(e) => {
                    let path = e.path().unwrap_or(&self.root).to_path_buf();
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            // Symlinks to directories are not descended into and are not files.
            if file_type.is_symlink() && entry.path().is_dir() {
                log::trace!("Skipping directory symlink: {}", entry.path().display());
                continue;
            }

            files.push(entry.into_path());
        }

        log::debug!(
            "Listed {} files under {} (recursive: {})",
            files.len(),
            self.root.display(),
            self.recursive
        );
        Ok(files)
    }

    fn root_error(&self, source: io::Error) -> ScanError {
        ScanError::Io {
            path: self.root.clone(),
            source,
        }
    }
}

/// List candidate files under `root`.
///
/// Convenience wrapper around [`Walker::list`].
pub fn list(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    Walker::new(root, recursive).list()
}
