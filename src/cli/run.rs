//! CLI entry point and dispatch logic.
//!
//! `run()` parses arguments, installs signal handling, initializes logging,
//! and dispatches to trace processing or join mode. It handles ALL output
//! including errors; main.rs only maps the returned code to a process exit.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, warn};

use crate::cli::args::Cli;
use crate::config::{Config, EXPORT_DIR};
use crate::error::TraceStatsError;
use crate::exit_codes::ExitCode;
use crate::{logging, pipeline, report, tracer::Tracer};

/// Main CLI execution function.
///
/// Returns `Ok(())` on success; on error it logs the failure and returns the
/// matching [`ExitCode`] for main.rs to pass to `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    // Signal handlers only set a flag; the feeder and classifier poll it at
    // their loop heads.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(err) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        }) {
            warn!("Unable to install signal handlers: {err}");
        }
    }

    let config = Config::from_cli(&cli);

    let result = if cli.join {
        report::join_exports(Path::new(EXPORT_DIR), &config.output)
    } else {
        run_traces(&cli, &config, &shutdown)
    };

    if let Err(err) = result {
        error!("{err}");
        return Err(err.to_exit_code());
    }
    Ok(())
}

fn run_traces(
    cli: &Cli,
    config: &Config,
    shutdown: &Arc<AtomicBool>,
) -> Result<(), TraceStatsError> {
    let tracer = Tracer::locate(cli.apitrace.as_deref(), cli.wine)?;
    tracer.validate()?;
    pipeline::process_traces(config, &tracer, shutdown)
}
