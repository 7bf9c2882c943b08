//! Diagnostic logging for HashKeeper.
//!
//! Diagnostics use the `log` facade with the `env_logger` backend and go
//! to stderr. Per-file results are not logged; they go through
//! [`crate::output::Sink`] on stdout.
//!
//! Level priority:
//!
//! 1. `RUST_LOG`, when set
//! 2. `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: timestamp, level, and from `-vv` the module path
//! - **Release builds**: level and message only
//!
//! # Example
//!
//! ```rust,no_run
//! use hashkeeper::logging::init_logging;
//!
//! // Warnings only
//! init_logging(0);
//!
//! // Store open, checkpoint timing, skipped files (-vv)
//! init_logging(2);
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize logging from the verbosity count.
///
/// Call once at startup, before the store is opened. Safe to call more
/// than once; later calls are ignored.
///
/// # Arguments
///
/// * `verbose` - `-v` count from the command line. It also sets the
///   console and transcript verbosity of the run's sink.
///
/// # Example
///
/// ```rust,no_run
/// use hashkeeper::logging::init_logging;
///
/// init_logging(1);
/// log::info!("Opened store");
/// ```
pub fn init_logging(verbose: u8) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!("Logging initialized at level: {:?}", determine_level(verbose));
    }
}

/// Log level for a `-v` count when `RUST_LOG` is unset.
fn determine_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 2 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}
