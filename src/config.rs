//! Resolved run configuration assembled from CLI arguments.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::appnames::AppNames;
use crate::cli::args::Cli;
use crate::parse::state::Api;
use crate::report::TraceNames;

/// Directory holding per-trace JSON exports.
pub const EXPORT_DIR: &str = "export";
/// Default export file name for multi-input and join runs.
pub const DEFAULT_EXPORT_FILE: &str = "tracestats.json";
/// Directory the shader blob dump pass writes into.
pub const SHADER_DUMPS_DIR: &str = "dumps";

/// Effective configuration for one invocation.
#[derive(Debug)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub name_override: Option<String>,
    pub link_override: Option<String>,
    pub skip: Vec<Api>,
    pub shader_dump: bool,
    pub appnames: AppNames,
}

impl Config {
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let skip = cli
            .skip
            .as_deref()
            .map(parse_skip_list)
            .unwrap_or_default();
        if !skip.is_empty() {
            info!("Skipping APIs: {skip:?}");
        }

        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output(&cli.input));

        Self {
            inputs: cli.input.clone(),
            output,
            name_override: cli.name.clone(),
            link_override: cli.link.clone(),
            skip,
            shader_dump: cli.dump,
            appnames: AppNames::load(cli.appnames.as_deref()),
        }
    }
}

/// Parse the case-insensitive skip filter; unknown tokens warn and drop.
fn parse_skip_list(csv: &str) -> Vec<Api> {
    csv.split(',')
        .filter(|token| !token.trim().is_empty())
        .filter_map(|token| match Api::from_str(token) {
            Ok(api) => Some(api),
            Err(_) => {
                warn!("Ignoring unknown API in skip filter: {}", token.trim());
                None
            }
        })
        .collect()
}

/// Single-input runs export next to a stem-derived name; everything else
/// goes to the shared default artifact.
fn default_output(inputs: &[PathBuf]) -> PathBuf {
    if inputs.len() == 1 {
        let names = TraceNames::derive(&inputs[0]);
        Path::new(EXPORT_DIR).join(format!("{}.json", names.export_stem()))
    } else {
        Path::new(EXPORT_DIR).join(DEFAULT_EXPORT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skip_list_normalizes_case() {
        assert_eq!(
            parse_skip_list("d3d9, D3D11"),
            vec![Api::D3D9, Api::D3D11]
        );
        assert_eq!(parse_skip_list("d3d9ex"), vec![Api::D3D9Ex]);
        assert_eq!(parse_skip_list("D3D9EX"), vec![Api::D3D9Ex]);
    }

    #[test]
    fn test_parse_skip_list_drops_unknown_tokens() {
        assert_eq!(parse_skip_list("d3d12, d3d9"), vec![Api::D3D9]);
        assert!(parse_skip_list("").is_empty());
    }

    #[test]
    fn test_default_output_single_input_uses_stem() {
        let inputs = vec![PathBuf::from("traces/quake3.trace.zst")];
        assert_eq!(
            default_output(&inputs),
            Path::new("export").join("quake3.json")
        );
    }

    #[test]
    fn test_default_output_multi_input_uses_shared_file() {
        let inputs = vec![PathBuf::from("a.trace"), PathBuf::from("b.trace")];
        assert_eq!(
            default_output(&inputs),
            Path::new("export").join("tracestats.json")
        );
        assert_eq!(
            default_output(&[]),
            Path::new("export").join("tracestats.json")
        );
    }
}
