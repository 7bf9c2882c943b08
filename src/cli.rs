//! Command-line interface definitions for HashKeeper.
//!
//! Exactly one mode flag selects the operation; the remaining flags are
//! modifiers, some of which only make sense for certain modes. clap checks
//! the mode group, and [`Cli::into_invocation`] checks the combinations
//! clap cannot express before any store is opened.
//!
//! # Example
//!
//! ```bash
//! # Hash every new file below /data into hashes.sqlite
//! hashkeeper -g -r /data
//!
//! # Re-hash known files too, tagging rewritten records with session 4
//! hashkeeper -g -r -u -s 4 /data
//!
//! # Verify a store made on Windows against the same tree mounted here
//! hashkeeper -c --db-path 'D:\data' --fs-path /mnt/d/data --path-conv-to u /mnt/d/data
//!
//! # List, then drop, records whose files are gone
//! hashkeeper -m /data
//! hashkeeper -p /data
//! ```

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use thiserror::Error;

use crate::actions::{MirrorCopier, MirrorError};
use crate::config::Config;
use crate::reconcile::{Operation, RunRequest};
use crate::scanner::path_utils::absolute_normalized;
use crate::store::{PathTranslation, SeparatorConversion, TranslateError, DEFAULT_SESSION};

/// Track SHA-256 digests of files in a SQLite store and verify them later.
///
/// HashKeeper records a digest for every file under a path, then reports
/// files that changed, appeared, or disappeared since.
#[derive(Debug, Parser)]
#[command(name = "hashkeeper")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["generate", "check", "enumerate", "missing", "prune"])
))]
pub struct Cli {
    /// File or directory to operate on
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Hash files that have no record yet
    #[arg(short, long)]
    pub generate: bool,

    /// Verify stored digests
    #[arg(short, long)]
    pub check: bool,

    /// List files that have no record
    #[arg(short, long)]
    pub enumerate: bool,

    /// List records whose file is gone
    #[arg(short, long)]
    pub missing: bool,

    /// Delete records whose file is gone
    #[arg(short, long)]
    pub prune: bool,

    /// Descend into subdirectories (generate, enumerate)
    #[arg(short, long)]
    pub recursive: bool,

    /// Re-hash known files and rewrite changed records (generate)
    #[arg(short, long)]
    pub update: bool,

    /// Report what would change without writing anything
    #[arg(short, long)]
    pub test_run: bool,

    /// Increase verbosity (-v progress, -vv detail, -vvv trace logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hash store to use [default: hashes.sqlite]
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Also write results to this file
    #[arg(short, long, value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Session tag for new and rewritten records (generate) [default: 1]
    #[arg(short, long, value_name = "N")]
    pub session: Option<i64>,

    /// Stored path prefix to replace before comparing
    #[arg(long, value_name = "PREFIX")]
    pub db_path: Option<String>,

    /// Filesystem prefix that replaces --db-path
    #[arg(long, value_name = "PREFIX")]
    pub fs_path: Option<String>,

    /// Convert stored separators to [u]nix or [w]indows style
    #[arg(long, value_name = "u|w")]
    pub path_conv_to: Option<SeparatorConversion>,

    /// Mirror every hashed file into this directory (generate)
    #[arg(long, value_name = "DIR")]
    pub copy_to: Option<PathBuf>,

    /// Print fatal errors as JSON
    #[arg(long)]
    pub json_errors: bool,
}

/// Flag combinations rejected before a run starts.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// `--recursive` outside generate and enumerate.
    #[error("--recursive is only valid with --generate or --enumerate, not {0}")]
    RecursiveNotAllowed(Operation),

    /// `--update` outside generate.
    #[error("--update is only valid with --generate, not {0}")]
    UpdateNotAllowed(Operation),

    /// `--session` outside generate.
    #[error("--session is only valid with --generate, not {0}")]
    SessionNotAllowed(Operation),

    /// `--copy-to` outside generate.
    #[error("--copy-to is only valid with --generate, not {0}")]
    CopyNotAllowed(Operation),

    /// Path substitution combined with a mutating operation.
    #[error("path substitution cannot be combined with {0}")]
    TranslationNotAllowed(Operation),

    /// Malformed substitution or conversion arguments.
    #[error(transparent)]
    Translation(#[from] TranslateError),

    /// The copy destination is unusable.
    #[error(transparent)]
    Copy(#[from] MirrorError),

    /// The root could not be made absolute.
    #[error("cannot resolve {path}: {source}")]
    Path {
        /// Path as given
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The transcript file could not be created.
    #[error("cannot open output file {path}: {source}")]
    Outfile {
        /// Requested transcript path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// A validated command line, merged with configuration.
#[derive(Debug)]
pub struct Invocation {
    /// Operation, root and modifiers
    pub request: RunRequest,
    /// Durable store path
    pub database: PathBuf,
    /// Transcript file
    pub outfile: Option<PathBuf>,
    /// Suppress mutations and checkpoints
    pub dry_run: bool,
    /// Verbosity count
    pub verbose: u8,
    /// Store rewrite to apply before the operation
    pub translation: Option<PathTranslation>,
    /// Copy side-channel for generate
    pub copier: Option<MirrorCopier>,
    /// Checkpoint spacing
    pub checkpoint_interval: Duration,
    /// Hash read size
    pub chunk_size: usize,
}

impl Cli {
    /// The selected operation.
    #[must_use]
    pub fn operation(&self) -> Operation {
        if self.generate {
            Operation::Generate
        } else if self.check {
            Operation::Check
        } else if self.enumerate {
            Operation::EnumerateNew
        } else if self.missing {
            Operation::EnumerateMissing
        } else {
            Operation::Prune
        }
    }

    /// Validate modifiers against the operation and merge `config`.
    ///
    /// # Errors
    ///
    /// Returns an [`ArgumentError`] for any combination the operation
    /// does not accept.
    pub fn into_invocation(self, config: &Config) -> Result<Invocation, ArgumentError> {
        let operation = self.operation();
        let generate = operation == Operation::Generate;

        if self.recursive && !matches!(operation, Operation::Generate | Operation::EnumerateNew) {
            return Err(ArgumentError::RecursiveNotAllowed(operation));
        }
        if self.update && !generate {
            return Err(ArgumentError::UpdateNotAllowed(operation));
        }
        if self.session.is_some() && !generate {
            return Err(ArgumentError::SessionNotAllowed(operation));
        }
        if self.copy_to.is_some() && !generate {
            return Err(ArgumentError::CopyNotAllowed(operation));
        }

        let translation = PathTranslation::from_args(self.db_path, self.fs_path, self.path_conv_to)?;
        if translation.is_some() && !operation.accepts_translation() {
            return Err(ArgumentError::TranslationNotAllowed(operation));
        }

        let root = absolute_normalized(&self.path).map_err(|source| ArgumentError::Path {
            path: self.path.clone(),
            source,
        })?;

        let copier = match &self.copy_to {
            Some(destination) => Some(MirrorCopier::new(&root, destination)?),
            None => None,
        };

        let request = RunRequest::new(operation, root)
            .with_recursive(self.recursive)
            .with_update(self.update)
            .with_session(self.session.unwrap_or(DEFAULT_SESSION));

        Ok(Invocation {
            request,
            database: self.database.unwrap_or_else(|| config.database.clone()),
            outfile: self.outfile,
            dry_run: self.test_run,
            verbose: self.verbose,
            translation,
            copier,
            checkpoint_interval: config.checkpoint_interval(),
            chunk_size: config.effective_chunk_size(),
        })
    }
}
