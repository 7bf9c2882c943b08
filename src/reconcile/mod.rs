//! Reconciliation between a directory tree and the hash store.
//!
//! # Operations
//!
//! | operation | candidates | mutates |
//! |---|---|---|
//! | generate | new files (all files with `update`) | inserts, updates |
//! | check | records under the root | never |
//! | enumerate-new | files without a record | never |
//! | enumerate-missing | records without a file | never |
//! | prune | records without a file | deletes |
//!
//! All of them run against a [`RunContext`]; [`execute`] dispatches one
//! [`RunRequest`] to the matching operation. The caller owns the context
//! and ends the run with [`RunContext::shutdown`], passing
//! [`Operation::persists`] so only mutating operations checkpoint.
//!
//! ```no_run
//! use hashkeeper::output::ConsoleSink;
//! use hashkeeper::reconcile::{execute, Operation, RunContext, RunRequest};
//! use hashkeeper::store::HashStore;
//! use std::path::PathBuf;
//!
//! let store = HashStore::open("hashes.sqlite".as_ref()).unwrap();
//! let mut ctx = RunContext::new(store, Box::new(ConsoleSink::new(0)));
//! let request = RunRequest::new(Operation::Check, PathBuf::from("/data"));
//! let report = execute(&mut ctx, &request);
//! ctx.shutdown(Operation::Check.persists()).unwrap();
//! println!("{:?}", report.unwrap());
//! ```

pub mod check;
pub mod checkpoint;
pub mod context;
pub mod diff;
pub mod generate;
pub mod policy;
pub mod prune;

use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::ScanError;
use crate::store::{StoreError, DEFAULT_SESSION};

pub use check::{check, CheckReport};
pub use checkpoint::{Checkpointer, DEFAULT_CHECKPOINT_INTERVAL};
pub use context::RunContext;
pub use diff::{DiffKind, Reconciler};
pub use generate::{generate, GenerateReport, UpdateEngine};
pub use policy::{Mutation, MutationPolicy};
pub use prune::{prune, PruneReport};

/// Fatal errors that end a run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// Shutdown was requested.
    #[error("Operation interrupted")]
    Interrupted,

    /// The root could not be enumerated.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The working copy or durable store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The single operation selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Hash new (or, with update, changed) files into the store.
    Generate,
    /// Verify stored digests against the files.
    Check,
    /// List files with no record.
    EnumerateNew,
    /// List records with no file.
    EnumerateMissing,
    /// Delete records with no file.
    Prune,
}

impl Operation {
    /// Whether the run ends with a checkpoint.
    #[must_use]
    pub fn persists(self) -> bool {
        matches!(self, Self::Generate | Self::Prune)
    }

    /// Whether a store path translation may precede the operation.
    #[must_use]
    pub fn accepts_translation(self) -> bool {
        !self.persists()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Generate => "generate",
            Self::Check => "check",
            Self::EnumerateNew => "enumerate-new",
            Self::EnumerateMissing => "enumerate-missing",
            Self::Prune => "prune",
        };
        f.write_str(name)
    }
}

/// An operation plus its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Selected operation
    pub operation: Operation,
    /// Absolute, normalized root
    pub root: PathBuf,
    /// Descend into subdirectories (generate, enumerate-new)
    pub recursive: bool,
    /// Re-hash known paths (generate)
    pub update: bool,
    /// Session tag for new and rewritten records (generate)
    pub session: i64,
}

impl RunRequest {
    /// Request with every modifier off and the default session.
    #[must_use]
    pub fn new(operation: Operation, root: PathBuf) -> Self {
        Self {
            operation,
            root,
            recursive: false,
            update: false,
            session: DEFAULT_SESSION,
        }
    }

    /// Set the recursive modifier.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the update modifier.
    #[must_use]
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Set the session tag.
    #[must_use]
    pub fn with_session(mut self, session: i64) -> Self {
        self.session = session;
        self
    }
}

/// What an operation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum RunReport {
    /// Result of generate
    Generated(GenerateReport),
    /// Result of check
    Checked(CheckReport),
    /// Paths listed by enumerate-new or enumerate-missing
    Enumerated {
        /// Which side of the diff was listed
        kind: DiffKind,
        /// Sorted paths
        paths: Vec<String>,
    },
    /// Result of prune
    Pruned(PruneReport),
}

/// Run the requested operation against `ctx`.
///
/// # Errors
///
/// Returns a [`RunError`] on an invalid root, a store failure or shutdown.
pub fn execute(ctx: &mut RunContext, request: &RunRequest) -> Result<RunReport, RunError> {
    log::info!("Running {} on {}", request.operation, request.root.display());
    let root = request.root.as_path();
    match request.operation {
        Operation::Generate => generate(
            ctx,
            root,
            request.recursive,
            request.update,
            request.session,
        )
        .map(RunReport::Generated),
        Operation::Check => check(ctx, root).map(RunReport::Checked),
        Operation::EnumerateNew => {
            let paths = Reconciler::enumerate(ctx, root, request.recursive, DiffKind::New)?;
            Ok(RunReport::Enumerated {
                kind: DiffKind::New,
                paths,
            })
        }
        Operation::EnumerateMissing => {
            let paths = Reconciler::enumerate(ctx, root, true, DiffKind::Missing)?;
            Ok(RunReport::Enumerated {
                kind: DiffKind::Missing,
                paths,
            })
        }
        Operation::Prune => prune(ctx, root).map(RunReport::Pruned),
    }
}
