//! Chunk classifier: the line-oriented core of the trace parser.
//!
//! Each line of the tracer's dump output is one of:
//! - a blank/padding line (dropped),
//! - a full-line `//` comment (dropped),
//! - a shader disassembly continuation (leading whitespace or a shader
//!   version identifier at the start of the line),
//! - a numbered API call line of the form `N Interface::Method(args…) = ret`.
//!
//! The first API-qualifying line fixes the trace's API; all further
//! extraction dispatches on it.

pub mod d3d1x;
pub mod d3d7;
pub mod d3d9;
pub mod scan;
pub mod shader;
pub mod state;
pub mod tables;
pub mod vendor;

use tracing::{debug, error, info, warn};

use self::state::{Api, ParseState};

/// Progress is logged once per this many processed calls.
const PROGRESS_LOG_CALLS: u64 = 10_000_000;

/// Immutable per-trace context the classifier needs for API detection.
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    /// Raw binary stem of the trace file, before cosmetic cleanup.
    pub binary_name_raw: String,
    /// API recorded for this binary in the side table, when known.
    pub side_api: Option<Api>,
    /// APIs the user asked to skip entirely.
    pub skip: Vec<Api>,
    /// Whether shader creation calls should be queued for the blob dump pass.
    pub shader_dump: bool,
}

/// Classifier verdict for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    /// The detected API is in the skip set; stop parsing this trace.
    SkipApi,
}

/// Process one chunk of raw lines. Returns `true` when parsing should stop
/// because the detected API is in the skip set.
pub fn process_chunk(state: &mut ParseState, job: &JobContext, lines: &[String]) -> bool {
    for raw in lines {
        if process_line(state, job, raw) == LineOutcome::SkipApi {
            return true;
        }
    }
    false
}

/// Classify and process a single raw dump line.
pub fn process_line(state: &mut ParseState, job: &JobContext, raw: &str) -> LineOutcome {
    let line = raw.trim_end();

    // there are, surprisingly, quite a lot of blank/padding
    // lines in an apitrace dump
    if line.is_empty() {
        return LineOutcome::Continue;
    }
    // early skip embedded full line comments
    if line.starts_with("//") {
        return LineOutcome::Continue;
    }

    // Some shaders have no indent, so the line start needs checking against
    // the version identifiers as well as plain whitespace.
    let shader_line = line.starts_with(' ')
        || shader::SHADER_VERSION_PREFIXES
            .iter()
            .any(|p| line.starts_with(p));

    let mut call_token = None;
    if !shader_line {
        // Only the call index and the call name matter, so two tokens suffice.
        let mut tokens = line.split_whitespace();
        let Some(index_token) = tokens.next() else {
            return LineOutcome::Continue;
        };
        // unnumbered lines are dropped here
        let Ok(call_index) = index_token.parse::<u64>() else {
            debug!("Skipped parsing of line: {line}");
            return LineOutcome::Continue;
        };
        if call_index < state.call_index && !state.monotonic_warned {
            warn!(
                "Call index decreased from {} to {call_index}; dump ordering is suspect",
                state.call_index
            );
            state.monotonic_warned = true;
        }
        state.call_index = call_index;
        call_token = tokens.next();

        if call_index > 0 && call_index % PROGRESS_LOG_CALLS == 0 {
            info!("Processed {call_index} apitrace calls...");
        }
    }

    let qualifies = shader_line
        || line.contains("::")
        || tables::API_BASE_CALLS.iter().any(|c| line.contains(c));
    if !qualifies {
        // these will usually be (numbered) memcpy lines
        return LineOutcome::Continue;
    }

    // Typically, the API entrypoint can be found on the first line of a dump.
    if state.api.is_none() && !shader_line {
        if let Some(token) = call_token {
            if let Some(api) = tables::detect_entry_api(token) {
                state.api = Some(api);
                info!("Detected API: {api}");

                if let Some(side_api) = job.side_api {
                    if side_api != api {
                        match tables::api_override(&job.binary_name_raw) {
                            None => warn!("Side table API value is mismatched from trace"),
                            Some(expected) if expected == side_api => {
                                info!("Known API value override detected");
                            }
                            Some(_) => error!("Unexpected API override value"),
                        }
                    }
                }

                if job.skip.contains(&api) {
                    return LineOutcome::SkipApi;
                }
            }
        }
    }

    let call = if shader_line {
        // a disassembly continuation, not an actual call
        ""
    } else {
        let Some(token) = call_token else {
            return LineOutcome::Continue;
        };
        let name = token.split('(').next().unwrap_or(token);
        state.api_calls.bump(name);
        name
    };

    match state.api {
        Some(Api::D3D7) => d3d7::extract(state, line, call),
        Some(Api::D3D8 | Api::D3D9 | Api::D3D9Ex) => {
            d3d9::extract(state, job, line, call, shader_line);
        }
        Some(Api::D3D10 | Api::D3D11) => d3d1x::extract(state, job, line, call, shader_line),
        _ => {}
    }

    LineOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(state: &mut ParseState, job: &JobContext, lines: &[&str]) -> bool {
        let owned: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
        process_chunk(state, job, &owned)
    }

    #[test]
    fn test_blank_and_comment_lines_mutate_nothing() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &["", "   ", "// this is a comment", "//1234 not a call"],
        );
        assert!(state.api_calls.is_empty());
        assert_eq!(state.api, None);
    }

    #[test]
    fn test_unnumbered_lines_skipped() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(&mut state, &job, &["warning: something happened"]);
        assert!(state.api_calls.is_empty());
    }

    #[test]
    fn test_entrypoint_detection_precedence() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9Ex(SDKVersion = 32, ppD3D = &0x1) = D3D_OK",
                "2 Direct3DCreate9(SDKVersion = 32) = &0x2",
            ],
        );
        assert_eq!(state.api, Some(Api::D3D9Ex));
        assert_eq!(state.api_calls.get("Direct3DCreate9Ex"), Some(1));
        assert_eq!(state.api_calls.get("Direct3DCreate9"), Some(1));
    }

    #[test]
    fn test_api_set_at_most_once() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate8(SDKVersion = 220) = &0x1",
                "2 Direct3DCreate9(SDKVersion = 32) = &0x2",
            ],
        );
        assert_eq!(state.api, Some(Api::D3D8));
    }

    #[test]
    fn test_api_skip_stops_parsing() {
        let mut state = ParseState::new();
        let job = JobContext {
            skip: vec![Api::D3D9],
            ..JobContext::default()
        };
        let skipped = feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "2 IDirect3D9::CreateDevice(DeviceType = D3DDEVTYPE_HAL, BehaviorFlags = D3DCREATE_PUREDEVICE, pPresentationParameters = ?) = D3D_OK",
            ],
        );
        assert!(skipped);
        assert_eq!(state.api, Some(Api::D3D9));
        // parsing stopped before the second line
        assert!(state.device_types.is_empty());
    }

    #[test]
    fn test_api_call_sum_matches_call_lines() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "",
                "// interlude",
                "2 IDirect3D9::CreateDevice(DeviceType = D3DDEVTYPE_HAL, BehaviorFlags = D3DCREATE_PUREDEVICE, pPresentationParameters = ?) = D3D_OK",
                "3 IDirect3DDevice9::BeginScene() = D3D_OK",
                "3 memcpy(dest = 0x1, src = 0x2, n = 64)",
                "4 IDirect3DDevice9::EndScene() = D3D_OK",
            ],
        );
        // memcpy carries no '::' and is not a known base call
        assert_eq!(state.api_calls.total(), 4);
        assert_eq!(state.api_calls.get("IDirect3DDevice9::BeginScene"), Some(1));
    }

    #[test]
    fn test_monotonic_warning_is_one_shot() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "10 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "5 IDirect3DDevice9::BeginScene() = D3D_OK",
                "3 IDirect3DDevice9::EndScene() = D3D_OK",
            ],
        );
        assert!(state.monotonic_warned);
        assert_eq!(state.call_index, 3);
        // parsing continued regardless
        assert_eq!(state.api_calls.total(), 3);
    }

    #[test]
    fn test_shader_version_across_lines() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "100 IDirect3DDevice9::CreateVertexShader(pFunction = &{...}, ppShader = &0x2) = D3D_OK",
                "    vs_3_0",
                "    dcl_position v0",
            ],
        );
        assert_eq!(state.shader_versions.get("vs_3_0"), Some(1));
        assert_eq!(state.shader_versions.len(), 1);
    }

    #[test]
    fn test_shader_blob_suppresses_version() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "100 IDirect3DDevice9::CreateVertexShader(pFunction = blob(1024), ppShader = &0x2) = D3D_OK",
                "    vs_3_0",
            ],
        );
        assert!(state.shader_versions.is_empty());
    }

    #[test]
    fn test_unindented_shader_line_detected() {
        let mut state = ParseState::new();
        let job = JobContext::default();
        feed(
            &mut state,
            &job,
            &[
                "1 Direct3DCreate9(SDKVersion = 32) = &0x1",
                "100 IDirect3DDevice9::CreatePixelShader(pFunction = &{...}) = D3D_OK",
                "ps_1_4 // no indent on some shaders",
            ],
        );
        assert_eq!(state.shader_versions.get("ps_1_4"), Some(1));
    }

    #[test]
    fn test_side_api_mismatch_does_not_change_detection() {
        let mut state = ParseState::new();
        let job = JobContext {
            binary_name_raw: "RebelGalaxy".to_string(),
            side_api: Some(Api::D3D11),
            ..JobContext::default()
        };
        feed(
            &mut state,
            &job,
            &["1 D3D10CreateDevice(pAdapter = NULL, Flags = 0x0) = S_OK"],
        );
        // the known override logs, the detected api stands
        assert_eq!(state.api, Some(Api::D3D10));
    }
}
