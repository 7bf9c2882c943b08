//! User-facing output for HashKeeper runs.
//!
//! Per-file outcomes (new, missing, mismatch, deleted, ...) are emitted
//! through a [`Sink`]. The sink decides, from the verbosity it was built
//! with, whether a message reaches the console and whether it is written
//! to the transcript file. Diagnostics go through `log` instead.
//!
//! # Architecture
//!
//! * [`console`]: stdout plus optional transcript file.
//! * [`memory`]: in-memory sink that records everything it receives.

pub mod console;
pub mod memory;

pub use console::ConsoleSink;
pub use memory::MemorySink;

use crate::scanner::path_utils::parent_key;

/// Class of a message, which fixes its console and transcript thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Run-level notices (listing, saving, timing). Console only.
    Notice,
    /// Per-file results that always matter.
    Outcome,
    /// Per-file progress (hashing, already correct).
    Progress,
    /// Fine-grained detail (checking, OK).
    Detail,
}

impl Level {
    /// Minimum verbosity for the console.
    #[must_use]
    pub fn console_threshold(self) -> u8 {
        match self {
            Self::Notice | Self::Outcome => 0,
            Self::Progress => 1,
            Self::Detail => 2,
        }
    }

    /// Minimum verbosity for the transcript; `None` means never transcribed.
    #[must_use]
    pub fn transcript_threshold(self) -> Option<u8> {
        match self {
            Self::Notice => None,
            Self::Outcome => Some(0),
            Self::Progress => Some(2),
            Self::Detail => Some(3),
        }
    }
}

/// Destination for per-file outcome messages.
pub trait Sink {
    /// Report one message at the given level.
    fn emit(&mut self, level: Level, message: &str);

    /// Push buffered transcript output to its destination.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Tracks the directory of the last processed file.
#[derive(Debug, Default)]
pub struct FolderTracker {
    previous: Option<String>,
}

impl FolderTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parent directory of `path` when it differs from the last one seen.
    pub fn enter(&mut self, path: &str) -> Option<String> {
        let dir = parent_key(path);
        if self.previous.as_deref() == Some(dir.as_str()) {
            None
        } else {
            self.previous = Some(dir.clone());
            Some(dir)
        }
    }
}
