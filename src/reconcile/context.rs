//! Per-run state shared by every operation.
//!
//! A [`RunContext`] owns the store, the output sink, the hasher, the
//! optional copy side-channel, the shutdown flag, the dry-run policy and
//! the checkpointer. Operations borrow it mutably; nothing is global.
//!
//! Every mutation goes through [`RunContext::insert`],
//! [`RunContext::update`], [`RunContext::delete`] or
//! [`RunContext::checkpoint`], each of which consults the
//! [`MutationPolicy`] first. [`RunContext::shutdown`] consumes the
//! context, so the final checkpoint and close happen at most once.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::actions::CopySink;
use crate::output::{Level, Sink};
use crate::scanner::path_utils::path_key;
use crate::scanner::{HashError, HashedFile, Hasher, Walker};
use crate::signal::ShutdownHandler;
use crate::store::{HashRecord, HashStore, PathFilter, StoreResult};

use super::checkpoint::Checkpointer;
use super::diff::{difference, DiffKind};
use super::policy::{Mutation, MutationPolicy};
use super::RunError;

/// Store, output and cancellation state for one invocation.
pub struct RunContext {
    store: HashStore,
    sink: Box<dyn Sink>,
    hasher: Hasher,
    copier: Option<Box<dyn CopySink>>,
    shutdown: ShutdownHandler,
    policy: MutationPolicy,
    checkpointer: Checkpointer,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("store", &self.store.durable_path())
            .field("policy", &self.policy)
            .field("mirroring", &self.copier.is_some())
            .field("checkpointer", &self.checkpointer)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Context with default hasher, no mirror, no dry-run and the default
    /// checkpoint interval.
    #[must_use]
    pub fn new(store: HashStore, sink: Box<dyn Sink>) -> Self {
        let shutdown = ShutdownHandler::new();
        Self {
            store,
            sink,
            hasher: Hasher::new().with_shutdown_flag(shutdown.get_flag()),
            copier: None,
            shutdown,
            policy: MutationPolicy::Apply,
            checkpointer: Checkpointer::default(),
        }
    }

    /// Use `handler` for cancellation (typically the Ctrl+C handler).
    #[must_use]
    pub fn with_shutdown(mut self, handler: ShutdownHandler) -> Self {
        self.hasher = self.hasher.with_shutdown_flag(handler.get_flag());
        self.shutdown = handler;
        self
    }

    /// Read files in chunks of `chunk_size` bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.hasher = self.hasher.with_chunk_size(chunk_size);
        self
    }

    /// Suppress all mutations and checkpoints.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.policy = MutationPolicy::from_dry_run(dry_run);
        self
    }

    /// Mirror every hashed file through `copier`.
    #[must_use]
    pub fn with_copier(mut self, copier: Box<dyn CopySink>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// Checkpoint every `interval` during long runs.
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpointer = Checkpointer::new(interval);
        self
    }

    /// Read access to the working copy.
    #[must_use]
    pub fn store(&self) -> &HashStore {
        &self.store
    }

    /// Whether mutations are being suppressed.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        !self.policy.permits()
    }

    /// Number of checkpoints written so far (the final one excluded).
    #[must_use]
    pub fn checkpoints(&self) -> usize {
        self.checkpointer.completed()
    }

    /// Send a message to the sink.
    pub fn emit(&mut self, level: Level, message: impl AsRef<str>) {
        self.sink.emit(level, message.as_ref());
    }

    /// Fail with [`RunError::Interrupted`] once shutdown was requested.
    pub fn check_cancelled(&self) -> Result<(), RunError> {
        if self.shutdown.is_shutdown_requested() {
            Err(RunError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Hash a file for recording, mirroring it when a copier is configured.
    ///
    /// The mirror is a side effect like any store write, so a dry run
    /// hashes without copying.
    pub fn hash_for_record(&mut self, path: &Path) -> Result<HashedFile, HashError> {
        let copy: Option<&mut dyn CopySink> = match self.copier.as_mut() {
            Some(copier) if self.policy.permits() => Some(&mut **copier),
            _ => None,
        };
        self.hasher.hash_file(path, copy)
    }

    /// Hash a file for verification only.
    pub fn hash_for_check(&self, path: &Path) -> Result<HashedFile, HashError> {
        self.hasher.hash_file(path, None)
    }

    /// Files under `root` as path keys, in traversal order.
    pub fn list(&mut self, root: &Path, recursive: bool) -> Result<Vec<String>, RunError> {
        self.emit(Level::Notice, "Listing files and folders...");
        let files = Walker::new(root, recursive)
            .with_shutdown_flag(self.shutdown.get_flag())
            .list()?;
        self.check_cancelled()?;
        Ok(files.iter().map(|p| path_key(p)).collect())
    }

    /// Set difference between the filesystem under `root` and the stored
    /// paths beneath it, sorted ascending.
    pub fn diff(
        &mut self,
        root: &Path,
        recursive: bool,
        kind: DiffKind,
    ) -> Result<Vec<String>, RunError> {
        let filesystem: BTreeSet<String> = self.list(root, recursive)?.into_iter().collect();
        let stored: BTreeSet<String> = self
            .store
            .query_paths(&PathFilter::for_root(root))?
            .into_iter()
            .collect();
        Ok(difference(&filesystem, &stored, kind))
    }

    /// Insert a new record unless dry-run.
    pub fn insert(&mut self, record: &HashRecord) -> StoreResult<Mutation> {
        if !self.policy.permits() {
            return Ok(Mutation::Suppressed);
        }
        self.store.insert(record)?;
        Ok(Mutation::Applied)
    }

    /// Replace an existing record unless dry-run.
    pub fn update(&mut self, record: &HashRecord) -> StoreResult<Mutation> {
        if !self.policy.permits() {
            return Ok(Mutation::Suppressed);
        }
        self.store.update(record)?;
        Ok(Mutation::Applied)
    }

    /// Remove a record unless dry-run.
    pub fn delete(&mut self, path: &str) -> StoreResult<Mutation> {
        if !self.policy.permits() {
            return Ok(Mutation::Suppressed);
        }
        if !self.store.delete(path)? {
            log::debug!("No record to delete for {}", path);
        }
        Ok(Mutation::Applied)
    }

    /// Mirror the working copy to disk now, unless dry-run.
    pub fn checkpoint(&mut self) -> StoreResult<Mutation> {
        if !self.policy.permits() {
            return Ok(Mutation::Suppressed);
        }
        self.checkpointer.run(&mut self.store, self.sink.as_mut())?;
        Ok(Mutation::Applied)
    }

    /// Checkpoint if the interval elapsed.
    pub fn maybe_checkpoint(&mut self) -> StoreResult<()> {
        if self.checkpointer.is_due() {
            self.checkpoint()?;
        }
        Ok(())
    }

    /// End the run: checkpoint when `persist` (and not dry-run), flush the
    /// sink and close the store.
    pub fn shutdown(mut self, persist: bool) -> StoreResult<()> {
        if persist {
            self.checkpoint()?;
        }
        if let Err(e) = self.sink.flush() {
            log::warn!("Unable to flush output: {}", e);
        }
        self.store.close()
    }
}
