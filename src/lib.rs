//! tracestats - generate API call statistics from apitrace dumps
//!
//! This crate drives the external `apitrace` utility in dump mode, streams its
//! textual output through a bounded producer/consumer pipeline, classifies
//! every call line against one of six Direct3D APIs, and emits a per-trace
//! JSON summary of call frequencies and extracted parameter values.

pub mod appnames;
pub mod cli;
pub mod config;
pub mod decompress;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod shader_dump;
pub mod tracer;

// Core types and errors used by external consumers
pub use config::Config;
pub use error::{TraceStatsError, TracerError};
pub use exit_codes::ExitCode;
pub use parse::state::{Api, Counter, ParseState};
pub use report::{ExportDoc, TraceResult};
