//! Time-driven checkpointing.
//!
//! Hash cost varies wildly between files, so checkpoints are spaced by
//! wall-clock time rather than record count.

use std::time::{Duration, Instant};

use crate::output::{Level, Sink};
use crate::store::{HashStore, StoreResult};

/// Default spacing between checkpoints during long runs.
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(300);

/// Flushes the working copy and transcript at a fixed interval.
#[derive(Debug)]
pub struct Checkpointer {
    interval: Duration,
    last: Instant,
    completed: usize,
}

impl Default for Checkpointer {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_INTERVAL)
    }
}

impl Checkpointer {
    /// Checkpointer that becomes due every `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
            completed: 0,
        }
    }

    /// Whether the interval has elapsed since the last checkpoint.
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.last.elapsed() >= self.interval
    }

    /// Number of checkpoints written so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Mirror the store to disk, flush the sink and restart the interval.
    pub fn run(&mut self, store: &mut HashStore, sink: &mut dyn Sink) -> StoreResult<()> {
        sink.emit(Level::Notice, "Saving store...");
        store.checkpoint()?;
        if let Err(e) = sink.flush() {
            log::warn!("Unable to flush output: {}", e);
        }
        self.last = Instant::now();
        self.completed += 1;
        Ok(())
    }
}
