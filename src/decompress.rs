//! External zstd decompression of `.zst` trace inputs.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{error, info};

use crate::error::TraceStatsError;

/// Decompress `input` to `output` by invoking the external `zstd` binary.
pub fn decompress_zst(input: &Path, output: &Path) -> Result<(), TraceStatsError> {
    info!("Decompressing trace file...");

    let status = Command::new("zstd")
        .args(["-d", "-f"])
        .arg(input)
        .arg("-o")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(TraceStatsError::Decompression(input.to_path_buf())),
    }
}

/// Remove a decompressed temporary trace file; failure is logged, not fatal.
pub fn remove_decompressed(path: &Path) {
    info!("Removing decompressed trace file...");
    if let Err(err) = std::fs::remove_file(path) {
        error!("Unable to clean up trace {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompress_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.trace.zst");
        let output = dir.path().join("missing.trace");
        let err = decompress_zst(&input, &output).unwrap_err();
        assert!(matches!(err, TraceStatsError::Decompression(_)));
    }

    #[test]
    fn test_remove_decompressed_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        remove_decompressed(&dir.path().join("already-gone.trace"));
    }
}
