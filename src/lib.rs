//! HashKeeper - file integrity ledger
//!
//! Records a SHA-256 digest per file in a SQLite store and later reports
//! which files changed, appeared, or disappeared. The store is worked on as
//! an in-memory copy and checkpointed back to disk periodically and when a
//! mutating run ends, so an interrupted run keeps its progress.

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod reconcile;
pub mod scanner;
pub mod signal;
pub mod store;

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::cli::{ArgumentError, Cli, Invocation};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{ConsoleSink, Level, Sink};
use crate::reconcile::{execute, RunContext, RunReport, RunRequest};
use crate::signal::ShutdownHandler;
use crate::store::{HashStore, PathTranslation};

/// Run the command line to completion.
///
/// # Errors
///
/// Returns the fatal error that ended the run; [`ExitCode::from_error`]
/// classifies it.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose);
    let config = Config::load();
    let invocation = cli.into_invocation(&config)?;
    let shutdown = signal::install_handler()?;
    run_invocation(invocation, shutdown).map(|_| ExitCode::Success)
}

/// Open the store, run the requested operation and wind the run down.
///
/// The shutdown sequence (final checkpoint for mutating operations, sink
/// flush, close) runs whether or not the operation succeeded.
///
/// # Errors
///
/// Fails if the transcript or store cannot be opened, the operation
/// fails or is interrupted, or the final checkpoint fails.
pub fn run_invocation(invocation: Invocation, shutdown: ShutdownHandler) -> Result<RunReport> {
    let started = Instant::now();
    let Invocation {
        request,
        database,
        outfile,
        dry_run,
        verbose,
        translation,
        copier,
        checkpoint_interval,
        chunk_size,
    } = invocation;

    let sink: Box<dyn Sink> = match &outfile {
        Some(path) => Box::new(ConsoleSink::with_transcript(verbose, path).map_err(|source| {
            ArgumentError::Outfile {
                path: path.clone(),
                source,
            }
        })?),
        None => Box::new(ConsoleSink::new(verbose)),
    };

    let store = HashStore::open(&database)?;
    log::info!("Opened store {}", store.durable_path().display());

    let mut ctx = RunContext::new(store, sink)
        .with_shutdown(shutdown)
        .with_dry_run(dry_run)
        .with_chunk_size(chunk_size)
        .with_checkpoint_interval(checkpoint_interval);
    if let Some(copier) = copier {
        ctx = ctx.with_copier(Box::new(copier));
    }

    let outcome = run_operation(&mut ctx, translation.as_ref(), &request);

    ctx.emit(
        Level::Notice,
        format!("Time : {}", format_elapsed(started.elapsed())),
    );
    let closed = ctx.shutdown(request.operation.persists());

    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                log::error!("Unable to save store after failure: {}", close_err);
            }
            Err(e)
        }
    }
}

fn run_operation(
    ctx: &mut RunContext,
    translation: Option<&PathTranslation>,
    request: &RunRequest,
) -> Result<RunReport> {
    if let Some(translation) = translation {
        translation.apply(ctx.store())?;
    }
    Ok(execute(ctx, request)?)
}

/// `H:MM:SS.ffffff`
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}
