//! Secondary shader blob dump pass.
//!
//! After classification, the recorded shader creation call indices are fed
//! back to the tracer with `--blob`. The index list is split into batches
//! because the tracer's CLI has a practical argument-length limit.

use std::path::Path;

use tracing::{debug, info};

use crate::config::SHADER_DUMPS_DIR;
use crate::error::TraceStatsError;
use crate::tracer::Tracer;

/// Call indices per tracer invocation.
pub const CALL_CHUNK_SIZE: usize = 10_000;

/// Dump the shader binaries for the recorded call indices into `dumps/`.
pub fn dump_shader_blobs(
    tracer: &Tracer,
    trace_path: &Path,
    calls: &[String],
) -> Result<(), TraceStatsError> {
    if calls.is_empty() {
        return Ok(());
    }

    info!("Dumping {} shader binaries...", calls.len());

    let current_dir = std::env::current_dir()?;
    let trace_absolute = if trace_path.is_absolute() {
        trace_path.to_path_buf()
    } else {
        current_dir.join(trace_path)
    };
    let dumps_dir = current_dir.join(SHADER_DUMPS_DIR);
    std::fs::create_dir_all(&dumps_dir)?;

    for batch in calls.chunks(CALL_CHUNK_SIZE) {
        let calls_csv = batch.join(",");
        debug!("Dumping shader binaries on calls: {calls_csv}");

        let status = tracer
            .blob_dump_command(&trace_absolute, &calls_csv, &dumps_dir)
            .status()?;
        if !status.success() {
            return Err(TraceStatsError::Internal(format!(
                "shader blob dump exited with {status}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_call_list_is_a_noop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let tracer = Tracer::locate(Some(file.path()), false).unwrap();
        dump_shader_blobs(&tracer, Path::new("game.trace"), &[]).unwrap();
    }

    #[test]
    fn test_batching_boundaries() {
        let calls: Vec<String> = (0..25_000).map(|i| i.to_string()).collect();
        let batches: Vec<usize> = calls.chunks(CALL_CHUNK_SIZE).map(<[String]>::len).collect();
        assert_eq!(batches, [10_000, 10_000, 5_000]);
    }
}
