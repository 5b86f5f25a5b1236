//! Shader-version extraction.
//!
//! Shader version identifiers can either be part of the shader creation call
//! itself, or appear on a disassembly line below it in the dump. A two-state
//! machine on [`ParseState`] tracks whether a creation call is open; version
//! tokens are only taken while inside one.

use tracing::warn;

use crate::parse::state::{Api, ParseState, ShaderContext};
use crate::parse::JobContext;

/// Shader creation call suffixes shared by D3D8/D3D9.
const SHADER_CALLS_D3D9: &[&str] = &["::CreateVertexShader", "::CreatePixelShader"];

/// Shader creation call suffixes for D3D10/D3D11.
const SHADER_CALLS_D3D1X: &[&str] = &[
    "::CreateVertexShader",
    "::CreatePixelShader",
    "::CreateComputeShader",
    "::CreateDomainShader",
    "::CreateGeometryShader",
    "::CreateHullShader",
];

/// Version prefixes recognized on disassembly lines.
pub const SHADER_VERSION_PREFIXES: &[&str] = &["vs_", "ps_", "cs_", "ds_", "gs_", "hs_"];
const SHADER_VERSION_PREFIXES_D3D9: &[&str] = &["vs_", "ps_"];

/// `prefix` plus `x_y` (major and minor version digits).
const SHADER_VERSION_OFFSET: usize = 3;

/// Which API family's shader conventions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderFamily {
    D3d9,
    D3d1x,
}

impl ShaderFamily {
    const fn creation_calls(self) -> &'static [&'static str] {
        match self {
            Self::D3d9 => SHADER_CALLS_D3D9,
            Self::D3d1x => SHADER_CALLS_D3D1X,
        }
    }

    const fn version_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::D3d9 => SHADER_VERSION_PREFIXES_D3D9,
            Self::D3d1x => SHADER_VERSION_PREFIXES,
        }
    }

    /// Marker for a creation call with no bytecode attached.
    const fn null_bytecode(self) -> &'static str {
        match self {
            Self::D3d9 => "pFunction = NULL",
            Self::D3d1x => "pShaderBytecode = NULL",
        }
    }

    /// Marker apitrace emits when disassembly failed and only a bytecode blob
    /// was dumped.
    const fn blob_bytecode(self) -> &'static str {
        match self {
            Self::D3d9 => "pFunction = blob",
            Self::D3d1x => "pShaderBytecode = blob",
        }
    }
}

/// Whether `call` is a shader creation call of the given family.
#[must_use]
pub fn is_shader_call(call: &str, family: ShaderFamily) -> bool {
    family.creation_calls().iter().any(|c| call.contains(c))
}

/// Feed one shader-relevant line (creation call or disassembly continuation)
/// through the state machine.
pub fn observe(
    state: &mut ParseState,
    job: &JobContext,
    line: &str,
    call: &str,
    shader_line: bool,
    family: ShaderFamily,
) {
    if !shader_line {
        // A creation call. Queue it for the blob dump pass when requested and
        // it actually carries bytecode.
        if job.shader_dump && state.call_index > 0 && !line.contains(family.null_bytecode()) {
            state.shader_dump_calls.push(state.call_index.to_string());
        }

        // Shader disassembly can fail, in which case apitrace dumps bytecode blobs
        if line.contains(family.blob_bytecode()) {
            warn!("Unable to parse shader version due to bytecode dump");
        } else if state.shader_ctx == ShaderContext::Neutral {
            state.shader_ctx = ShaderContext::InShaderCall;
        } else {
            warn!("Shader call context already detected");
        }
    }

    if state.shader_ctx != ShaderContext::InShaderCall {
        return;
    }

    // strip any comments from a shader line
    let line = if shader_line {
        line.split("//").next().unwrap_or(line).trim_end()
    } else {
        line
    };

    // D3D8 handles FVF through CreateVertexShader, and there is no other way
    // to track these, so treat them as 'vs_fvf' shader versions instead.
    if family == ShaderFamily::D3d9
        && state.api == Some(Api::D3D8)
        && call.contains("::CreateVertexShader")
        && line.contains("pFunction = NULL")
    {
        state.shader_versions.bump("vs_fvf");
        state.shader_ctx = ShaderContext::Neutral;
        return;
    }

    let version = family.version_prefixes().iter().find_map(|prefix| {
        let pos = line.find(prefix)?;
        line.get(pos..pos + prefix.len() + SHADER_VERSION_OFFSET)
    });

    if let Some(version) = version {
        // Two underscores exactly, to filter out dubious string matches.
        if version.bytes().filter(|&b| b == b'_').count() == 2 {
            state.shader_versions.bump(version);
            state.shader_ctx = ShaderContext::Neutral;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_job() -> JobContext {
        JobContext {
            shader_dump: true,
            ..JobContext::default()
        }
    }

    fn call_of(line: &str) -> &str {
        line.split_whitespace()
            .nth(1)
            .and_then(|t| t.split('(').next())
            .unwrap()
    }

    fn d3d9_state() -> ParseState {
        let mut state = ParseState::new();
        state.api = Some(Api::D3D9);
        state
    }

    #[test]
    fn test_version_from_continuation_line() {
        let mut state = d3d9_state();
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice9::CreateVertexShader(pFunction = &{...}, ppShader = &0x1) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        assert_eq!(state.shader_ctx, ShaderContext::InShaderCall);

        observe(&mut state, &job, "    vs_3_0", "", true, ShaderFamily::D3d9);
        assert_eq!(state.shader_versions.get("vs_3_0"), Some(1));
        assert_eq!(state.shader_ctx, ShaderContext::Neutral);
    }

    #[test]
    fn test_blob_dump_records_nothing() {
        let mut state = d3d9_state();
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice9::CreateVertexShader(pFunction = blob(1024), ppShader = &0x1) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        // no disassembly follows a blob dump, so no context opens
        assert_eq!(state.shader_ctx, ShaderContext::Neutral);

        observe(&mut state, &job, "    vs_3_0", "", true, ShaderFamily::D3d9);
        assert!(state.shader_versions.is_empty());
    }

    #[test]
    fn test_comment_stripped_from_continuation() {
        let mut state = d3d9_state();
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice9::CreatePixelShader(pFunction = &{...}) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        observe(
            &mut state,
            &job,
            "    // approximately 10 instruction slots used",
            "",
            true,
            ShaderFamily::D3d9,
        );
        // the comment line carries no version; context stays open
        assert_eq!(state.shader_ctx, ShaderContext::InShaderCall);
        observe(&mut state, &job, "    ps_2_0", "", true, ShaderFamily::D3d9);
        assert_eq!(state.shader_versions.get("ps_2_0"), Some(1));
    }

    #[test]
    fn test_underscore_guard_rejects_partial_matches() {
        let mut state = d3d9_state();
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice9::CreateVertexShader(pFunction = &{...}) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        // 'vs_abc' has only one underscore in the captured window
        observe(&mut state, &job, "    vs_abcdef", "", true, ShaderFamily::D3d9);
        assert!(state.shader_versions.is_empty());
        assert_eq!(state.shader_ctx, ShaderContext::InShaderCall);
    }

    #[test]
    fn test_d3d8_fvf_declaration() {
        let mut state = ParseState::new();
        state.api = Some(Api::D3D8);
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice8::CreateVertexShader(pDeclaration = &{...}, pFunction = NULL, pHandle = &1, Usage = 0) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        assert_eq!(state.shader_versions.get("vs_fvf"), Some(1));
        assert_eq!(state.shader_ctx, ShaderContext::Neutral);
    }

    #[test]
    fn test_version_on_creation_line_itself() {
        let mut state = ParseState::new();
        state.api = Some(Api::D3D11);
        let job = JobContext::default();
        let creation = "100 ID3D11Device::CreateComputeShader(pShaderBytecode = &{...}) = S_OK // cs_5_0";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d1x);
        assert_eq!(state.shader_versions.get("cs_5_0"), Some(1));
        assert_eq!(state.shader_ctx, ShaderContext::Neutral);
    }

    #[test]
    fn test_shader_dump_call_recording() {
        let mut state = d3d9_state();
        state.call_index = 123;
        let job = dump_job();
        let creation = "123 IDirect3DDevice9::CreateVertexShader(pFunction = &{...}) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        assert_eq!(state.shader_dump_calls, vec!["123".to_string()]);

        // NULL bytecode never queues a dump
        state.call_index = 124;
        let creation = "124 IDirect3DDevice9::CreateVertexShader(pFunction = NULL) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        assert_eq!(state.shader_dump_calls.len(), 1);
    }

    #[test]
    fn test_double_creation_warns_but_keeps_context() {
        let mut state = d3d9_state();
        let job = JobContext::default();
        let creation = "100 IDirect3DDevice9::CreateVertexShader(pFunction = &{...}) = D3D_OK";
        observe(&mut state, &job, creation, call_of(creation), false, ShaderFamily::D3d9);
        let creation2 = "101 IDirect3DDevice9::CreatePixelShader(pFunction = &{...}) = D3D_OK";
        observe(&mut state, &job, creation2, call_of(creation2), false, ShaderFamily::D3d9);
        assert_eq!(state.shader_ctx, ShaderContext::InShaderCall);
    }
}
