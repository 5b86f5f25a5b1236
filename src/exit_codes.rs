//! Exit code constants for the tracestats CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `TRACER_NOT_FOUND` | apitrace not found on `$PATH` (also general failure) |
//! | 2 | `TRACER_PATH_INVALID` | `--apitrace` does not point at a regular file |
//! | 3 | `TRACER_VERSION_TOO_OLD` | apitrace version below 12.0 |
//! | 4 | `TRACER_VERSION_UNPARSABLE` | apitrace version output could not be parsed |
//! | 5 | `TRACER_INVOCATION_FAILED` | apitrace could not be invoked |
//! | 6 | `DECOMPRESSION_FAILED` | zstd decompression of a trace failed |
//! | 7 | `JOIN_PARSE_FAILED` | a JSON export could not be parsed in join mode |
//! | 130 | `INTERRUPTED` | halted by SIGINT/SIGTERM |

/// Type-safe exit code for tracestats operations.
///
/// Use the named constants for the documented failure modes, or
/// [`as_i32()`](Self::as_i32) to get the numeric value for
/// `std::process::exit()`. The numeric values are part of the public CLI
/// contract and will not change within a major release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// apitrace was not found on `$PATH` and no explicit path was given
    pub const TRACER_NOT_FOUND: ExitCode = ExitCode(1);

    /// General/internal failure (shares the numeric value of `TRACER_NOT_FOUND`)
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// The explicit apitrace path is not a regular file
    pub const TRACER_PATH_INVALID: ExitCode = ExitCode(2);

    /// The apitrace version is below the supported minimum of 12.0
    pub const TRACER_VERSION_TOO_OLD: ExitCode = ExitCode(3);

    /// The apitrace `version` output did not have the expected shape
    pub const TRACER_VERSION_UNPARSABLE: ExitCode = ExitCode(4);

    /// Running the apitrace executable failed outright
    pub const TRACER_INVOCATION_FAILED: ExitCode = ExitCode(5);

    /// zstd failed to decompress a `.zst` trace input
    pub const DECOMPRESSION_FAILED: ExitCode = ExitCode(6);

    /// A JSON export in the export directory could not be parsed in join mode
    pub const JOIN_PARSE_FAILED: ExitCode = ExitCode(7);

    /// Halted by SIGINT/SIGTERM
    pub const INTERRUPTED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an `ExitCode` from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::TRACER_NOT_FOUND.as_i32(), 1);
        assert_eq!(ExitCode::TRACER_PATH_INVALID.as_i32(), 2);
        assert_eq!(ExitCode::TRACER_VERSION_TOO_OLD.as_i32(), 3);
        assert_eq!(ExitCode::TRACER_VERSION_UNPARSABLE.as_i32(), 4);
        assert_eq!(ExitCode::TRACER_INVOCATION_FAILED.as_i32(), 5);
        assert_eq!(ExitCode::DECOMPRESSION_FAILED.as_i32(), 6);
        assert_eq!(ExitCode::JOIN_PARSE_FAILED.as_i32(), 7);
        assert_eq!(ExitCode::INTERRUPTED.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_roundtrip() {
        assert_eq!(ExitCode::from_i32(6), ExitCode::DECOMPRESSION_FAILED);
        let raw: i32 = ExitCode::JOIN_PARSE_FAILED.into();
        assert_eq!(raw, 7);
        assert_eq!(ExitCode::from(130), ExitCode::INTERRUPTED);
    }
}
