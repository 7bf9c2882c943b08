//! Copy side-channel that mirrors hashed files into a destination tree.
//!
//! # Overview
//!
//! [`MirrorCopier`] maps each source file under the source root to the
//! same relative path under the destination root. Bytes arrive chunk by
//! chunk from the hasher through a [`CopyHandle`]; on finalize the copy is
//! flushed and given the source's access and modification times.
//!
//! A destination inside the source root is refused: the mirror would be
//! enumerated (and copied again) on the next run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use thiserror::Error;

use crate::scanner::path_utils::{absolute_normalized, is_within};

/// Configuration errors for the mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The destination is the source root or lies beneath it.
    #[error("copy destination {destination} is inside source {source_root}")]
    NestedDestination {
        /// Source root
        source_root: PathBuf,
        /// Requested destination
        destination: PathBuf,
    },

    /// A path could not be made absolute.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// An open destination file receiving one source file's bytes.
#[derive(Debug)]
pub struct CopyHandle {
    writer: BufWriter<File>,
    source: PathBuf,
    destination: PathBuf,
}

impl CopyHandle {
    /// Source file being mirrored.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination file being written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl Write for CopyHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Receives the bytes of files as they are hashed.
pub trait CopySink {
    /// Open the destination for `source`.
    fn open_destination(&mut self, source: &Path) -> io::Result<CopyHandle>;

    /// Flush and close `handle`, then apply the source's timestamps.
    fn close_and_finalize(&mut self, handle: CopyHandle) -> io::Result<()>;

    /// Close `handle` and remove the incomplete destination.
    fn abort(&mut self, handle: CopyHandle) -> io::Result<()>;
}

/// Mirrors files from a source root into a destination root.
#[derive(Debug, Clone)]
pub struct MirrorCopier {
    source_base: PathBuf,
    destination_root: PathBuf,
}

impl MirrorCopier {
    /// Configure a mirror of `source_root` into `destination_root`.
    ///
    /// When `source_root` is a single file, its parent directory is the base.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::NestedDestination`] if the destination is
    /// equal to or inside the source base.
    pub fn new(source_root: &Path, destination_root: &Path) -> Result<Self, MirrorError> {
        let absolute = |path: &Path| {
            absolute_normalized(path).map_err(|source| MirrorError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let source_root = absolute(source_root)?;
        let destination_root = absolute(destination_root)?;

        let source_base = if source_root.is_file() {
            source_root
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_root.clone())
        } else {
            source_root
        };

        if is_within(&destination_root, &source_base) {
            return Err(MirrorError::NestedDestination {
                source_root: source_base,
                destination: destination_root,
            });
        }

        Ok(Self {
            source_base,
            destination_root,
        })
    }

    /// Where `source` lands in the mirror.
    #[must_use]
    pub fn destination_for(&self, source: &Path) -> PathBuf {
        match source.strip_prefix(&self.source_base) {
            Ok(relative) => self.destination_root.join(relative),
            Err(_) => self
                .destination_root
                .join(source.file_name().unwrap_or(source.as_os_str())),
        }
    }
}

impl CopySink for MirrorCopier {
    fn open_destination(&mut self, source: &Path) -> io::Result<CopyHandle> {
        let destination = self.destination_for(source);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&destination)?;
        log::trace!("Copying {} -> {}", source.display(), destination.display());
        Ok(CopyHandle {
            writer: BufWriter::new(file),
            source: source.to_path_buf(),
            destination,
        })
    }

    fn close_and_finalize(&mut self, handle: CopyHandle) -> io::Result<()> {
        let CopyHandle {
            writer,
            source,
            destination,
        } = handle;
        let file = match writer.into_inner() {
            Ok(file) => file,
            Err(e) => {
                remove_partial(&destination)?;
                return Err(e.into_error());
            }
        };
        if let Err(e) = file.sync_all() {
            drop(file);
            remove_partial(&destination)?;
            return Err(e);
        }
        drop(file);

        let metadata = fs::metadata(&source)?;
        let atime = FileTime::from_last_access_time(&metadata);
        let mtime = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_times(&destination, atime, mtime)?;
        Ok(())
    }

    fn abort(&mut self, handle: CopyHandle) -> io::Result<()> {
        let CopyHandle {
            writer,
            destination,
            ..
        } = handle;
        drop(writer);
        log::debug!("Discarding partial copy {}", destination.display());
        remove_partial(&destination)
    }
}

fn remove_partial(destination: &Path) -> io::Result<()> {
    match fs::remove_file(destination) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
