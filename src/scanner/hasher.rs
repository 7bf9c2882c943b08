//! SHA-256 file hasher with streaming support.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing SHA-256 hashes
//! of file contents. Files are read in fixed-size chunks so memory use is
//! bounded regardless of file size. Each chunk can optionally be forwarded
//! to a [`CopySink`] before hashing continues.

use std::fs::{File, Metadata};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use super::HashError;
use crate::actions::{CopyHandle, CopySink};

/// Chunk size for streaming reads (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// A 256-bit SHA-256 digest.
pub type Hash = [u8; 32];

/// Result of hashing one file: the digest plus the metadata observed
/// through the same open handle.
#[derive(Debug, Clone)]
pub struct HashedFile {
    /// SHA-256 of the file content
    pub hash: Hash,
    /// File size in bytes
    pub size: u64,
    /// Creation time (falls back to modification time where unsupported)
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
}

impl HashedFile {
    /// Hex-encoded digest.
    #[must_use]
    pub fn hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Whether a stored hex digest (either case) names this content.
    #[must_use]
    pub fn matches_hex(&self, hex: &str) -> bool {
        hex_to_hash(hex) == Some(self.hash)
    }
}

/// Streaming SHA-256 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 1 MiB chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Override the read chunk size. Zero falls back to [`CHUNK_SIZE`].
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        self
    }

    /// Set the shutdown flag; it is checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the SHA-256 digest of a file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.hash_file(path, None).map(|hashed| hashed.hash)
    }

    /// Hash a file and capture its metadata, optionally mirroring the bytes.
    ///
    /// Copy failures are logged and stop the copy for this file only; the
    /// digest is still computed. When hashing fails or is interrupted, the
    /// partial copy is discarded so the mirror never holds a truncated file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, or
    /// [`HashError::Interrupted`] if shutdown was requested mid-file.
    pub fn hash_file(
        &self,
        path: &Path,
        copy: Option<&mut dyn CopySink>,
    ) -> Result<HashedFile, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let metadata = file.metadata().map_err(|e| HashError::from_io(path, e))?;

        let mut copy: Option<(&mut dyn CopySink, CopyHandle)> = match copy {
            Some(sink) => match sink.open_destination(path) {
                Ok(handle) => Some((sink, handle)),
                Err(e) => {
                    log::warn!("Unable to open copy destination for {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        let digest = self.digest_stream(&mut file, path, &mut copy);
        if let Some((sink, handle)) = copy {
            match digest {
                Ok(_) => finalize_copy(sink, handle, path),
                Err(_) => abort_copy(sink, handle, path),
            }
        }

        Ok(HashedFile {
            hash: digest?,
            size: metadata.len(),
            created: created_time(&metadata),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn digest_stream(
        &self,
        file: &mut File,
        path: &Path,
        copy: &mut Option<(&mut dyn CopySink, CopyHandle)>,
    ) -> Result<Hash, HashError> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                log::debug!("Hashing interrupted: {}", path.display());
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            let chunk = &buffer[..bytes_read];

            let copy_failed = match copy.as_mut() {
                Some((_, handle)) => handle.write_all(chunk).err(),
                None => None,
            };
            if let Some(e) = copy_failed {
                log::warn!("Copy of {} failed, continuing hash only: {}", path.display(), e);
                if let Some((sink, handle)) = copy.take() {
                    abort_copy(sink, handle, path);
                }
            }

            hasher.update(chunk);
        }

        Ok(hasher.finalize().into())
    }
}

fn finalize_copy(sink: &mut dyn CopySink, handle: CopyHandle, path: &Path) {
    if let Err(e) = sink.close_and_finalize(handle) {
        log::warn!("Unable to finalize copy of {}: {}", path.display(), e);
    }
}

fn abort_copy(sink: &mut dyn CopySink, handle: CopyHandle, path: &Path) {
    if let Err(e) = sink.abort(handle) {
        log::warn!("Unable to discard partial copy of {}: {}", path.display(), e);
    }
}

/// Creation time where the platform records it, else modification time.
fn created_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Encode a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decode a 64-character hex string into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
