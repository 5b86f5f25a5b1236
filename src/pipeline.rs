//! Per-trace producer/consumer pipeline.
//!
//! Two threads cooperate over one bounded channel: the feeder (main thread)
//! blocks on the tracer subprocess's stdout and publishes fixed-size line
//! chunks; the classifier thread drains chunks under exclusive ownership of
//! the parse state. The channel bound caps memory regardless of dump size,
//! and classification stays sequential because call ordering is part of the
//! contract.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::decompress;
use crate::error::TraceStatsError;
use crate::parse::state::{Api, ParseState};
use crate::parse::{self, JobContext};
use crate::report::{self, ExportDoc, TraceNames, TraceResult};
use crate::shader_dump;
use crate::tracer::Tracer;

/// Lines per published chunk.
pub const CHUNK_LINES: usize = 100_000;
/// Channel capacity in chunks.
pub const QUEUE_CHUNKS: usize = 10;
/// Classifier receive timeout, so shutdown flags are observed between chunks.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Process every input trace and write the export artifact.
pub fn process_traces(
    config: &Config,
    tracer: &Tracer,
    shutdown: &Arc<AtomicBool>,
) -> Result<(), TraceStatsError> {
    let mut doc = ExportDoc::default();

    for input in &config.inputs {
        if shutdown.load(Ordering::Relaxed) {
            return Err(TraceStatsError::Interrupted);
        }
        if !input.is_file() {
            warn!("File not found, skipping: {}", input.display());
            continue;
        }
        if let Some(result) = process_one(config, tracer, shutdown, input)? {
            doc.tracestats.push(result);
        }
    }

    if !config.shader_dump && !doc.tracestats.is_empty() {
        report::write_export(&config.output, &doc)?;
    }
    Ok(())
}

/// Process a single trace; `Ok(None)` means the trace contributed nothing
/// (skipped, aborted, or shader dump mode).
fn process_one(
    config: &Config,
    tracer: &Tracer,
    shutdown: &Arc<AtomicBool>,
    input: &Path,
) -> Result<Option<TraceResult>, TraceStatsError> {
    info!("Processing trace: {}", input.display());

    let names = TraceNames::derive(input);
    let entry = config.appnames.get(&names.raw);

    let name = if let Some(name) = config.name_override.clone() {
        info!("Using application name: {name}");
        name
    } else if let Some(name) = entry.and_then(|e| e.name.clone()) {
        info!("Application name found in side table: {name}");
        name
    } else {
        info!("Defaulting application name to: {}", names.binary_name);
        names.binary_name.clone()
    };

    let link = if let Some(link) = config.link_override.clone() {
        info!("Using application link: {link}");
        Some(link)
    } else {
        let link = entry.and_then(|e| e.link.clone());
        if let Some(link) = &link {
            info!("Application link found in side table: {link}");
        }
        link
    };

    let side_api = entry
        .and_then(|e| e.api.as_deref())
        .and_then(|api| Api::from_str(api).ok());
    if let Some(api) = side_api {
        info!("Application API found in side table: {api}");
        if config.skip.contains(&api) {
            info!("Skipped trace due to API filter");
            return Ok(None);
        }
    }

    let trace_path = if names.compressed {
        decompress::decompress_zst(input, &names.decompressed_path)?;
        names.decompressed_path.clone()
    } else {
        input.to_path_buf()
    };

    let job = JobContext {
        binary_name_raw: names.raw.clone(),
        side_api,
        skip: config.skip.clone(),
        shader_dump: config.shader_dump,
    };

    let outcome = run_pipeline(tracer, shutdown, &trace_path, job);

    // The decompressed temporary is removed on every exit path.
    let cleanup = || {
        if names.compressed {
            decompress::remove_decompressed(&names.decompressed_path);
        }
    };

    let (state, api_skipped) = match outcome {
        Ok(value) => value,
        Err(err) => {
            cleanup();
            return Err(err);
        }
    };

    let result = match state {
        None => None,
        Some(_) if api_skipped => {
            info!("Skipped trace due to API filter");
            None
        }
        Some(state) if config.shader_dump => {
            if let Err(err) =
                shader_dump::dump_shader_blobs(tracer, &trace_path, &state.shader_dump_calls)
            {
                error!("Shader blob dump failed: {err}");
            }
            info!("Trace processing complete");
            None
        }
        Some(state) => {
            info!("Trace processing complete");
            Some(TraceResult::from_state(
                state,
                names.binary_name.clone(),
                name,
                link,
            ))
        }
    };

    cleanup();
    Ok(result)
}

/// Wire up the two threads for one trace.
///
/// Returns the finalized parse state (or `None` when the dump subprocess
/// failed) and whether the API skip fired.
fn run_pipeline(
    tracer: &Tracer,
    shutdown: &Arc<AtomicBool>,
    trace_path: &Path,
    job: JobContext,
) -> Result<(Option<ParseState>, bool), TraceStatsError> {
    let (sender, receiver) = bounded::<Vec<String>>(QUEUE_CHUNKS);
    let api_skip = Arc::new(AtomicBool::new(false));
    let process_loop = Arc::new(AtomicBool::new(true));

    let worker = {
        let api_skip = Arc::clone(&api_skip);
        let process_loop = Arc::clone(&process_loop);
        let shutdown = Arc::clone(shutdown);
        thread::spawn(move || classify_worker(&receiver, &job, &api_skip, &process_loop, &shutdown))
    };

    let feed_outcome = match tracer.dump_command(trace_path).spawn() {
        Ok(mut child) => {
            let outcome = feed_lines(&mut child, &sender, shutdown, &api_skip);
            if !matches!(outcome, FeedOutcome::Finished(_)) {
                terminate_child(&mut child);
            }
            outcome
        }
        Err(err) => FeedOutcome::SpawnError(err),
    };

    // Close the channel and signal the classifier so it drains and exits.
    drop(sender);
    process_loop.store(false, Ordering::Relaxed);
    let state = worker
        .join()
        .map_err(|_| TraceStatsError::Internal("classifier thread panicked".to_string()))?;

    let api_skipped = api_skip.load(Ordering::Relaxed);

    match feed_outcome {
        FeedOutcome::Finished(status) if status.success() => Ok((Some(state), api_skipped)),
        FeedOutcome::Finished(status) => {
            error!("apitrace dump process exited with {status}");
            Ok((None, api_skipped))
        }
        // The classifier hung up early; only the API skip does that.
        FeedOutcome::Disconnected => Ok((Some(state), api_skipped)),
        FeedOutcome::Shutdown => Err(TraceStatsError::Interrupted),
        FeedOutcome::SpawnError(err) | FeedOutcome::ReadError(err) => {
            error!("Critical exception during the apitrace dump process: {err}");
            Ok((None, api_skipped))
        }
    }
}

enum FeedOutcome {
    /// EOF reached and the child reaped.
    Finished(std::process::ExitStatus),
    /// The classifier dropped the channel (API skip fast exit).
    Disconnected,
    /// The shutdown flag fired mid-stream.
    Shutdown,
    SpawnError(std::io::Error),
    ReadError(std::io::Error),
}

/// Read the dump line by line, batching into chunks.
fn feed_lines(
    child: &mut Child,
    sender: &Sender<Vec<String>>,
    shutdown: &Arc<AtomicBool>,
    api_skip: &Arc<AtomicBool>,
) -> FeedOutcome {
    let Some(stdout) = child.stdout.take() else {
        return FeedOutcome::ReadError(std::io::Error::other("child stdout not captured"));
    };
    let mut reader = BufReader::new(stdout);
    let mut chunk: Vec<String> = Vec::with_capacity(CHUNK_LINES);
    let mut line = String::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            warn!("Halting processing due to a termination signal...");
            return FeedOutcome::Shutdown;
        }
        if api_skip.load(Ordering::Relaxed) {
            return FeedOutcome::Disconnected;
        }

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                // flush any pending chunk lines
                if !chunk.is_empty() && sender.send(std::mem::take(&mut chunk)).is_err() {
                    return FeedOutcome::Disconnected;
                }
                info!("End of trace dump output detected");
                return match child.wait() {
                    Ok(status) => FeedOutcome::Finished(status),
                    Err(err) => FeedOutcome::ReadError(err),
                };
            }
            Ok(_) => {
                chunk.push(std::mem::take(&mut line));
                if chunk.len() == CHUNK_LINES {
                    if sender.send(std::mem::take(&mut chunk)).is_err() {
                        return FeedOutcome::Disconnected;
                    }
                    chunk = Vec::with_capacity(CHUNK_LINES);
                }
            }
            Err(err) => return FeedOutcome::ReadError(err),
        }
    }
}

/// Classifier thread body: drain chunks until the channel closes, the
/// process loop clears, or the API skip fires.
fn classify_worker(
    receiver: &Receiver<Vec<String>>,
    job: &JobContext,
    api_skip: &Arc<AtomicBool>,
    process_loop: &Arc<AtomicBool>,
    shutdown: &Arc<AtomicBool>,
) -> ParseState {
    let mut state = ParseState::new();

    loop {
        if api_skip.load(Ordering::Relaxed) || shutdown.load(Ordering::Relaxed) {
            break;
        }
        match receiver.recv_timeout(RECV_TIMEOUT) {
            Ok(chunk) => {
                if parse::process_chunk(&mut state, job, &chunk) {
                    api_skip.store(true, Ordering::Relaxed);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !process_loop.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    state
}

/// Best-effort child termination for abort paths.
fn terminate_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
