//! Error types for msvcfind operations.
//!
//! This module defines [`MsvcFindError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! Three classes of failure are kept strictly apart:
//!
//! - Configuration errors (bad preference list, conflicting flags) are
//!   `MsvcFindError` values and map to exit status 2.
//! - Per-candidate probe and validation failures are not errors at all:
//!   components return `Option`/`bool` and log a diagnostic, the candidate
//!   is excluded, the run continues.
//! - Overall resolution failure is [`MsvcFindError::NoCompilerFound`] and
//!   maps to exit status 1.

use thiserror::Error;

/// Core error type for msvcfind operations.
#[derive(Debug, Error)]
pub enum MsvcFindError {
    /// Malformed preference list (unknown or repeated token).
    #[error("Invalid preference list: {message}")]
    InvalidPreference { message: String },

    /// Mutually exclusive or incomplete command-line flags.
    #[error("Invalid invocation: {message}")]
    ConflictingArguments { message: String },

    /// No installation satisfied the preference list.
    #[error("No Microsoft C/C++ compiler could be resolved")]
    NoCompilerFound,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MsvcFindError {
    /// The process exit status this error maps to.
    ///
    /// Configuration errors exit 2, resolution failure exits 1. Unexpected
    /// errors are reported as malformed invocations.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCompilerFound => 1,
            _ => 2,
        }
    }
}

/// Result type alias for msvcfind operations.
pub type Result<T> = std::result::Result<T, MsvcFindError>;
