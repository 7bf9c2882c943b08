//! Scanner module for path enumeration and content hashing.
//!
//! This module provides functionality for:
//! - Listing candidate files under a root using walkdir
//! - Streaming SHA-256 content hashing in fixed-size chunks
//! - Lexical path normalization for stored keys
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: SHA-256 file hashing (streaming)
//! - [`path_utils`]: Absolute/normalized path handling
//!
//! # Example
//!
//! ```no_run
//! use hashkeeper::scanner::{Hasher, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/data"), true);
//! let hasher = Hasher::new();
//! for path in walker.list().unwrap() {
//!     match hasher.hash(&path) {
//!         Ok(hash) => println!("{}  {}", hashkeeper::scanner::hash_to_hex(&hash), path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, HashedFile, Hasher, CHUNK_SIZE};
pub use walker::Walker;

/// Errors that can occur while enumerating a root.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root is neither an existing file nor an existing directory.
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// An I/O error occurred while resolving the root.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
///
/// All variants except [`HashError::Interrupted`] are per-file and
/// recoverable: the caller reports them and moves on to the next file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file vanished before or while it was read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing was abandoned because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Map an I/O error on `path` to the matching variant.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
