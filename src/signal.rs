//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared between the signal hook, the walker and
//! the hasher. Setting it never aborts work directly: the reconcile loop
//! notices the flag between files (and the hasher between chunks), stops,
//! and the run is wound down through the normal shutdown path so the
//! working copy is checkpointed before exit.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hashkeeper::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//!
//! // Between files
//! if handler.is_shutdown_requested() {
//!     return;
//! }
//!
//! // For the walker and the hasher
//! let flag = handler.get_flag();
//! ```
//!
//! # Exit Codes
//!
//! When the signal arrives:
//! - the flag is set to `true`
//! - "Interrupted. Saving store..." is printed to stderr
//! - the run ends with [`EXIT_CODE_INTERRUPTED`] once the store is saved

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation flag.
///
/// Cloning the handler shares the flag; every clone observes the same
/// request.
///
/// # Thread Safety
///
/// `ShutdownHandler` is `Send` and `Sync`. The signal hook runs on its own
/// thread and only ever stores `true`.
///
/// # Example
///
/// ```rust
/// use hashkeeper::signal::ShutdownHandler;
///
/// let handler = ShutdownHandler::new();
/// let worker_view = handler.clone();
///
/// handler.request_shutdown();
/// assert!(worker_view.is_shutdown_requested());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether cancellation was requested.
    ///
    /// # Returns
    ///
    /// `true` after Ctrl+C or a call to
    /// [`request_shutdown`](Self::request_shutdown).
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the walker and hasher.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashkeeper::scanner::Hasher;
    /// use hashkeeper::signal::ShutdownHandler;
    ///
    /// let handler = ShutdownHandler::new();
    /// let hasher = Hasher::new().with_shutdown_flag(handler.get_flag());
    /// ```
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can serve another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The platform refused the hook.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// Call once before the run starts. Repeated calls (several runs in one
/// test process) reuse and reset the installed handler. When some other
/// code already owns the hook, an unhooked handler is returned; it still
/// honours [`ShutdownHandler::request_shutdown`].
///
/// # Returns
///
/// The handler whose flag the hook sets.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the platform cannot register
/// the hook at all.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Saving store...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            if let Some(handler) = GLOBAL_HANDLER.get() {
                handler.reset();
                return Ok(handler.clone());
            }
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let fallback = ShutdownHandler::new();
            let _ = GLOBAL_HANDLER.set(fallback.clone());
            Ok(fallback)
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler without any signal hook, for library callers and tests.
#[must_use]
pub fn create_handler() -> ShutdownHandler {
    ShutdownHandler::new()
}
