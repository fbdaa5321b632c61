//! Error types for relic-unpack
//!
//! Every failure is a returned value. The variants mirror the stages of a request:
//! - Request validation (source, destination)
//! - Classification (not an archive, recognized but not implemented)
//! - ZIP introspection (password protected, unreadable container)
//! - External program invocation (unavailable, failed, timed out, silent)
//! - The composite failure that records why every fallback step failed

use crate::adapters::Adapter;
use crate::types::Format;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for relic-unpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for relic-unpack
#[derive(Debug, Error)]
pub enum Error {
    /// The classifier could not match the source to any known archive format
    #[error("{path} is not an archive")]
    NotAnArchive {
        /// The file that was classified
        path: PathBuf,
    },

    /// The format was recognized but is deliberately not supported
    #[error("{format} archive format is not implemented: {path}")]
    FormatNotImplemented {
        /// The file that was classified
        path: PathBuf,
        /// The recognized format
        format: Format,
    },

    /// The extraction destination is missing or is not a directory
    #[error("invalid destination {path}: {reason}")]
    DestinationInvalid {
        /// The destination path
        path: PathBuf,
        /// Why the destination cannot be used
        reason: String,
    },

    /// The source archive is missing, empty or not a regular file
    #[error("invalid source {path}: {reason}")]
    SourceInvalid {
        /// The source path
        path: PathBuf,
        /// Why the source cannot be used
        reason: String,
    },

    /// The source archive exceeds the configured extraction ceiling
    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    SourceTooLarge {
        /// The source path
        path: PathBuf,
        /// Size of the source in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },

    /// A ZIP entry carries the encryption flag
    #[error("{format} archive is password protected: {archive}")]
    PasswordProtected {
        /// The encrypted archive
        archive: PathBuf,
        /// The container format the encryption flag was found in
        format: Format,
    },

    /// The ZIP container structure could not be located or read
    #[error("invalid zip {path}: {reason}")]
    InvalidZip {
        /// The file that was parsed
        path: PathBuf,
        /// What was wrong with the structure
        reason: String,
    },

    /// A re-packed ZIP could not be written
    #[error("cannot write zip {path}: {source}")]
    ZipWrite {
        /// The ZIP being written
        path: PathBuf,
        /// The writer failure
        #[source]
        source: zip::result::ZipError,
    },

    /// The external program could not be found or started
    #[error("program {program} is unavailable: {reason}")]
    ProgramUnavailable {
        /// The configured program name or path
        program: String,
        /// Lookup or spawn failure
        reason: String,
    },

    /// The external program terminated with a failure status
    #[error("program {program} failed ({}): {stderr}", describe_status(.code))]
    ProgramError {
        /// The program that failed
        program: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The external program produced no usable output where content was expected
    #[error("program {program} produced no usable output")]
    EmptyOutput {
        /// The program that stayed silent
        program: String,
    },

    /// The external program exceeded its time bound and was killed
    #[error("program {program} timed out after {after:?}")]
    Timeout {
        /// The program that was canceled
        program: String,
        /// The bound that was exceeded
        after: Duration,
    },

    /// The program cannot restrict extraction to named entries
    #[error("program {program} cannot extract individual entries")]
    TargetsUnsupported {
        /// The program that always extracts everything
        program: String,
    },

    /// Every step of the strategy failed or was skipped
    #[error("all {} steps failed for {format} archive: {}", step_count(.failures), describe_failures(.failures))]
    AllFallbacksExhausted {
        /// The detected format
        format: Format,
        /// Per-step causes, in the order the steps were tried
        failures: Vec<StepFailure>,
    },

    /// A step failed in a way no later step can recover from
    ///
    /// Carries the steps that failed or were skipped before it.
    #[error("{format} extraction stopped: {cause}")]
    Aborted {
        /// The detected format
        format: Format,
        /// Per-step causes recorded before the chain stopped
        failures: Vec<StepFailure>,
        /// The error that stopped the chain
        cause: Box<Error>,
    },

    /// A required link extension is malformed
    #[error("not a valid extension, it must be in the format .ext: {extension:?}")]
    InvalidExtension {
        /// The rejected extension
        extension: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "timeouts.lookup")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single strategy step did not produce the extraction
#[derive(Debug)]
pub struct StepFailure {
    /// The adapter the step would have run
    pub adapter: Adapter,
    /// What happened to the step
    pub cause: StepCause,
}

/// Outcome of a step that did not succeed
#[derive(Debug)]
pub enum StepCause {
    /// The adapter ran and failed
    Failed(Box<Error>),
    /// The adapter was never invoked
    Skipped(String),
}

impl StepFailure {
    pub(crate) fn failed(adapter: Adapter, error: Error) -> Self {
        Self {
            adapter,
            cause: StepCause::Failed(Box::new(error)),
        }
    }

    pub(crate) fn skipped(adapter: Adapter, reason: impl Into<String>) -> Self {
        Self {
            adapter,
            cause: StepCause::Skipped(reason.into()),
        }
    }

    /// The underlying error when the adapter actually ran
    pub fn error(&self) -> Option<&Error> {
        match &self.cause {
            StepCause::Failed(e) => Some(e),
            StepCause::Skipped(_) => None,
        }
    }

    /// Returns true if the adapter was never invoked
    pub fn is_skipped(&self) -> bool {
        matches!(self.cause, StepCause::Skipped(_))
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            StepCause::Failed(e) => write!(f, "{}: {}", self.adapter, e),
            StepCause::Skipped(reason) => write!(f, "{}: skipped, {}", self.adapter, reason),
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {}", c),
        None => "terminated by signal".to_string(),
    }
}

fn step_count(failures: &[StepFailure]) -> usize {
    failures.len()
}

fn describe_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .enumerate()
        .map(|(i, f)| format!("[{}] {}", i + 1, f))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Returns true if the next step of a fallback chain may still succeed
    ///
    /// Program failures are local to one adapter. Validation failures and
    /// password protection hold for every adapter, so they end the chain.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ProgramUnavailable { .. }
                | Error::ProgramError { .. }
                | Error::EmptyOutput { .. }
                | Error::Timeout { .. }
                | Error::TargetsUnsupported { .. }
                | Error::Io(_)
        )
    }

    /// The per-step causes of a composite failure, empty for any other error
    pub fn step_failures(&self) -> &[StepFailure] {
        match self {
            Error::AllFallbacksExhausted { failures, .. } | Error::Aborted { failures, .. } => {
                failures
            }
            _ => &[],
        }
    }

    /// The error that actually stopped a request
    ///
    /// Unwraps [`Error::Aborted`], any other error is its own cause.
    pub fn cause(&self) -> &Error {
        match self {
            Error::Aborted { cause, .. } => cause.cause(),
            other => other,
        }
    }

    /// Machine-readable error code
    ///
    /// An aborted chain reports the code of the error that stopped it.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Aborted { cause, .. } => cause.code(),
            Error::NotAnArchive { .. } => "not_an_archive",
            Error::FormatNotImplemented { .. } => "format_not_implemented",
            Error::DestinationInvalid { .. } => "destination_invalid",
            Error::SourceInvalid { .. } => "source_invalid",
            Error::SourceTooLarge { .. } => "source_too_large",
            Error::PasswordProtected { .. } => "password_protected",
            Error::InvalidZip { .. } => "invalid_zip",
            Error::ZipWrite { .. } => "zip_write",
            Error::ProgramUnavailable { .. } => "program_unavailable",
            Error::ProgramError { .. } => "program_error",
            Error::EmptyOutput { .. } => "empty_output",
            Error::Timeout { .. } => "timeout",
            Error::TargetsUnsupported { .. } => "targets_unsupported",
            Error::AllFallbacksExhausted { .. } => "all_fallbacks_exhausted",
            Error::InvalidExtension { .. } => "invalid_extension",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
        }
    }
}
