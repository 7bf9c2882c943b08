//! Structured error handling and exit codes.

use serde::Serialize;

use crate::cli::ArgumentError;
use crate::reconcile::RunError;
use crate::scanner::ScanError;
use crate::store::StoreError;

/// Exit codes for the HashKeeper application.
///
/// - 0: Success (operation completed, whatever it reported)
/// - 1: General error (unexpected I/O or SQL failure mid-run)
/// - 2: Invalid root path
/// - 3: Invalid durable store
/// - 4: Invalid arguments
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the selected operation ran to completion.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// The root path is neither an existing file nor a directory.
    InvalidPath = 2,
    /// The durable store exists but is not a recognizable store.
    InvalidDatabase = 3,
    /// Flag combinations or path-substitution arguments are malformed.
    InvalidArguments = 4,
    /// Interrupted: the run was cancelled by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HK000",
            Self::GeneralError => "HK001",
            Self::InvalidPath => "HK002",
            Self::InvalidDatabase => "HK003",
            Self::InvalidArguments => "HK004",
            Self::Interrupted => "HK130",
        }
    }

    /// Classify an application error into its exit code.
    ///
    /// The typed errors are wrapped transparently, so each layer is
    /// downcast explicitly instead of walking the source chain.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        if let Some(run) = err.downcast_ref::<RunError>() {
            return match run {
                RunError::Interrupted => Self::Interrupted,
                RunError::Scan(scan) => Self::from_scan(scan),
                RunError::Store(store) => Self::from_store(store),
            };
        }
        if let Some(scan) = err.downcast_ref::<ScanError>() {
            return Self::from_scan(scan);
        }
        if let Some(store) = err.downcast_ref::<StoreError>() {
            return Self::from_store(store);
        }
        if err.downcast_ref::<ArgumentError>().is_some() {
            return Self::InvalidArguments;
        }
        Self::GeneralError
    }

    fn from_scan(err: &ScanError) -> Self {
        match err {
            ScanError::InvalidPath(_) => Self::InvalidPath,
            ScanError::Io { .. } => Self::GeneralError,
        }
    }

    fn from_store(err: &StoreError) -> Self {
        if err.is_invalid_database() {
            Self::InvalidDatabase
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HK002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the run was cancelled
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
