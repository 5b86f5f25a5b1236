//! CLI argument definitions and parsing structures

use clap::Parser;
use std::path::PathBuf;

/// tracestats - generate API call statistics from apitraces
#[derive(Parser, Debug)]
#[command(name = "tracestats")]
#[command(about = "Generate API call statistics from apitrace dumps")]
#[command(long_about = r#"
tracestats drives apitrace in dump mode against one or more trace files,
classifies every call against one of the supported Direct3D APIs (D3D7, D3D8,
D3D9, D3D9Ex, D3D10, D3D11) and writes a per-trace JSON summary of call
frequencies and extracted parameter values.

EXAMPLES:
  # Process a single trace
  tracestats -i game.trace

  # Process several traces into one export, skipping D3D11 captures
  tracestats -i first.trace second.trace.zst --skip d3d11 -o export/combined.json

  # Join every per-trace export in the export directory
  tracestats --join

  # Dump the shader binaries referenced by a trace
  tracestats -i game.trace --dump

Trace inputs may be compressed (*.trace.zst); they are decompressed through
the external zstd binary and the temporary file is removed afterwards.
"#)]
#[command(version)]
pub struct Cli {
    /// Paths of apitrace files to process
    #[arg(
        short,
        long,
        num_args = 1..,
        value_name = "PATH",
        conflicts_with = "join",
        required_unless_present = "join"
    )]
    pub input: Vec<PathBuf>,

    /// Join all traces in the export directory into a single tracestats.json file
    #[arg(short, long)]
    pub join: bool,

    /// Path and filename of the JSON export
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name for the apitraced application
    #[arg(short, long)]
    pub name: Option<String>,

    /// Web link for the application
    #[arg(short, long)]
    pub link: Option<String>,

    /// APIs to skip, comma separated, e.g.: d3d9,d3d11
    #[arg(short, long, value_name = "CSV")]
    pub skip: Option<String>,

    /// Dump the shader binaries included in an apitrace
    #[arg(short, long)]
    pub dump: bool,

    /// Path to the apitrace executable
    #[arg(short, long, value_name = "PATH")]
    pub apitrace: Option<PathBuf>,

    /// Use wine to launch the apitrace executable
    #[arg(short, long)]
    pub wine: bool,

    /// Path to a JSON side table with application names, links and APIs
    #[arg(long, value_name = "FILE")]
    pub appnames: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}
