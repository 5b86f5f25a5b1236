//! Error taxonomy with exit code mapping.
//!
//! Library code returns [`TraceStatsError`] and does NOT call
//! `std::process::exit()`. The CLI maps errors to exit codes via
//! [`TraceStatsError::to_exit_code`] and displays them once, at the top.

use std::path::PathBuf;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Failures while locating or validating the external apitrace executable.
///
/// Each variant carries its own exit code so that startup failures are
/// distinguishable from the shell.
#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Unable to find apitrace. Ensure it is in $PATH or use --apitrace to specify the full path.")]
    NotFound,

    #[error("Invalid apitrace path specified: {0}")]
    InvalidPath(PathBuf),

    #[error("Invalid apitrace version {0}. At least apitrace 12.0 is required.")]
    VersionTooOld(String),

    #[error("Unable to parse the apitrace version output")]
    VersionUnparsable,

    #[error("Invalid apitrace executable: {0}")]
    InvocationFailed(String),
}

/// Top-level error type returned by tracestats library operations.
#[derive(Error, Debug)]
pub enum TraceStatsError {
    #[error(transparent)]
    Tracer(#[from] TracerError),

    #[error("Unable to decompress trace file: {0}")]
    Decompression(PathBuf),

    #[error("Unable to parse JSON file: {0}")]
    JoinParse(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Halting processing due to a termination signal")]
    Interrupted,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TraceStatsError {
    /// Map this error to the documented CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Tracer(TracerError::NotFound) => ExitCode::TRACER_NOT_FOUND,
            Self::Tracer(TracerError::InvalidPath(_)) => ExitCode::TRACER_PATH_INVALID,
            Self::Tracer(TracerError::VersionTooOld(_)) => ExitCode::TRACER_VERSION_TOO_OLD,
            Self::Tracer(TracerError::VersionUnparsable) => ExitCode::TRACER_VERSION_UNPARSABLE,
            Self::Tracer(TracerError::InvocationFailed(_)) => ExitCode::TRACER_INVOCATION_FAILED,
            Self::Decompression(_) => ExitCode::DECOMPRESSION_FAILED,
            Self::JoinParse(_) => ExitCode::JOIN_PARSE_FAILED,
            Self::Interrupted => ExitCode::INTERRUPTED,
            Self::Io(_) | Self::Internal(_) => ExitCode::INTERNAL,
        }
    }
}
