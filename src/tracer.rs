//! Tracer driver: locates, validates and invokes the external apitrace
//! executable.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::TracerError;

/// Minimum supported apitrace version.
const MIN_APITRACE_VERSION: f64 = 12.0;

/// A located (and optionally wine-wrapped) apitrace executable.
#[derive(Debug, Clone)]
pub struct Tracer {
    path: PathBuf,
    wine: bool,
}

impl Tracer {
    /// Resolve the apitrace executable.
    ///
    /// Without an explicit path, the executable is looked up on `$PATH`. An
    /// explicit path must point at a regular file.
    pub fn locate(explicit: Option<&Path>, wine: bool) -> Result<Self, TracerError> {
        let path = match explicit {
            None => which::which("apitrace").map_err(|_| TracerError::NotFound)?,
            Some(p) => {
                if p.is_file() {
                    p.to_path_buf()
                } else {
                    return Err(TracerError::InvalidPath(p.to_path_buf()));
                }
            }
        };
        Ok(Self { path, wine })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn base_command(&self) -> Command {
        if self.wine {
            let mut command = Command::new("wine");
            command.arg(&self.path);
            command
        } else {
            Command::new(&self.path)
        }
    }

    /// Run `apitrace version` and require a supported version.
    ///
    /// The first whitespace-delimited output token must be `apitrace` and the
    /// second must parse as a number of at least 12.0.
    pub fn validate(&self) -> Result<(), TracerError> {
        let output = self
            .base_command()
            .arg("version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|err| TracerError::InvocationFailed(err.to_string()))?;

        if !output.status.success() {
            return Err(TracerError::InvocationFailed(format!(
                "apitrace version exited with {}",
                output.status
            )));
        }

        let stdout =
            String::from_utf8(output.stdout).map_err(|_| TracerError::VersionUnparsable)?;
        let mut tokens = stdout.split_whitespace();
        let (Some(tool), Some(version)) = (tokens.next(), tokens.next()) else {
            return Err(TracerError::VersionUnparsable);
        };
        if tool != "apitrace" {
            return Err(TracerError::VersionUnparsable);
        }
        let number: f64 = version
            .parse()
            .map_err(|_| TracerError::VersionUnparsable)?;
        if number < MIN_APITRACE_VERSION {
            return Err(TracerError::VersionTooOld(version.to_string()));
        }

        debug!("Using apitrace version {version}");
        Ok(())
    }

    /// The dump invocation for one trace file.
    ///
    /// Mind the `-v` (verbose) flag here, otherwise apitrace dump will skip
    /// various calls.
    #[must_use]
    pub fn dump_command(&self, trace: &Path) -> Command {
        let mut command = self.base_command();
        command
            .args(["dump", "-v", "--color=never"])
            .arg(trace)
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }

    /// The blob dump invocation for a batch of shader creation call indices.
    #[must_use]
    pub fn blob_dump_command(&self, trace: &Path, calls_csv: &str, cwd: &Path) -> Command {
        let mut command = self.base_command();
        command
            .args(["dump", "--blob"])
            .arg(format!("--calls={calls_csv}"))
            .arg(trace)
            .current_dir(cwd)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_rejects_non_file_path() {
        let err = Tracer::locate(Some(Path::new("/definitely/not/a/file")), false).unwrap_err();
        assert!(matches!(err, TracerError::InvalidPath(_)));

        let dir = tempfile::tempdir().unwrap();
        let err = Tracer::locate(Some(dir.path()), false).unwrap_err();
        assert!(matches!(err, TracerError::InvalidPath(_)));
    }

    #[test]
    fn test_locate_accepts_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tracer = Tracer::locate(Some(file.path()), false).unwrap();
        assert_eq!(tracer.path(), file.path());
    }

    #[test]
    fn test_dump_command_shape() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tracer = Tracer::locate(Some(file.path()), false).unwrap();
        let command = tracer.dump_command(Path::new("game.trace"));
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["dump", "-v", "--color=never", "game.trace"]);
        assert_eq!(command.get_program(), file.path().as_os_str());
    }

    #[test]
    fn test_wine_wraps_the_program() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tracer = Tracer::locate(Some(file.path()), true).unwrap();
        let command = tracer.dump_command(Path::new("game.trace"));
        assert_eq!(command.get_program(), "wine");
        let first: Vec<String> = command
            .get_args()
            .take(1)
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(first[0], file.path().to_string_lossy());
    }

    #[test]
    fn test_blob_dump_command_shape() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tracer = Tracer::locate(Some(file.path()), false).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let command = tracer.blob_dump_command(Path::new("/tmp/game.trace"), "1,2,3", dir.path());
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["dump", "--blob", "--calls=1,2,3", "/tmp/game.trace"]);
        assert_eq!(command.get_current_dir(), Some(dir.path()));
    }
}
