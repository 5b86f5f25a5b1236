//! Extraction rules for D3D10 and D3D11 traces.

use crate::parse::scan;
use crate::parse::shader::{self, ShaderFamily};
use crate::parse::state::ParseState;
use crate::parse::JobContext;

const DEVICE_FLAGS_AND_FEATURE_LEVELS_CALL: &str = "CreateDevice";
const SWAPCHAIN_PARAMETERS_CALL: &str = "::CreateSwapChain";
const SWAPCHAIN_DEVICE_PARAMETERS_CALL: &str = "CreateDeviceAndSwapChain";
const QUERY_TYPE_CALL: &str = "::CreateQuery";
const RASTIZER_STATE_CALL: &str = "::CreateRasterizerState";
const BLEND_STATE_CALL: &str = "::CreateBlendState";
const CREATE_BASE_CALL: &str = "::Create";

const SWAPCHAIN_PARAMETERS_IDENTIFIER: &str = "pDesc = &{";
const SWAPCHAIN_PARAMETERS_IDENTIFIER_2: &str = "pSwapChainDesc = &{";
const SWAPCHAIN_PARAMETERS_IDENTIFIER_END: &str = "}, pFullscreenDesc =";
const SWAPCHAIN_PARAMETERS_IDENTIFIER_END_2: &str = "}, ppSwapChain =";

/// Swap-chain description keys worth tracking.
const SWAPCHAIN_PARAMETERS_CAPTURED: &[&str] = &[
    "AlphaMode",
    "BufferCount",
    "BufferUsage",
    "Flags",
    "Format",
    "ScanlineOrdering",
    "Quality",
    "Count",
    "Scaling",
    "Stereo",
    "SwapEffect",
];

const RASTIZER_STATE_IDENTIFIER: &str = "pRasterizerDesc = &{";
const RASTIZER_STATE_SKIPPED: &[&str] = &["DepthBias", "DepthBiasClamp", "SlopeScaledDepthBias"];

const BLEND_STATE_IDENTIFIER: &str = "pBlendStateDesc = &{";
const BLEND_STATE_IDENTIFIER_END_D3D10: &str = ", BlendEnable = ";
const BLEND_STATE_IDENTIFIER_END_D3D11: &str = ", RenderTarget = ";

const USAGE_SKIP_IDENTIFIER: &str = "DXGI_USAGE_";

pub fn extract(
    state: &mut ParseState,
    job: &JobContext,
    line: &str,
    call: &str,
    shader_line: bool,
) {
    if call.contains(DEVICE_FLAGS_AND_FEATURE_LEVELS_CALL) {
        device_flags_and_feature_levels(state, line);
    }

    // CreateDeviceAndSwapChain lines need swap-chain parameter parsing too,
    // so this is not part of the chain below.
    if call.contains(SWAPCHAIN_PARAMETERS_CALL) || call.contains(SWAPCHAIN_DEVICE_PARAMETERS_CALL)
    {
        swapchain_parameters(state, line);
    } else if call.contains(QUERY_TYPE_CALL) {
        if let Some(query_type) = scan::value_after(line, "Query = ", ",") {
            state.query_types.bump(query_type);
        }
    } else if call.contains(RASTIZER_STATE_CALL) {
        rastizer_state(state, line);
    } else if call.contains(BLEND_STATE_CALL) {
        blend_state(state, line);
    } else if shader::is_shader_call(call, ShaderFamily::D3d1x) || shader_line {
        shader::observe(state, job, line, call, shader_line, ShaderFamily::D3d1x);
    } else if call.contains(CREATE_BASE_CALL) {
        generic_create(state, line);
    }
}

fn device_flags_and_feature_levels(state: &mut ParseState, line: &str) {
    if !line.contains("Flags = 0x0") {
        if let Some(flags) = scan::value_after(line, "Flags = ", ",") {
            for flag in flags.split('|') {
                state.device_flags.bump(flag.trim());
            }
        }
    }

    if line.contains("pFeatureLevels = NULL") {
        return;
    }
    if line.contains("pFeatureLevels = {") {
        if let Some(levels) = scan::value_after(line, "pFeatureLevels = {", "}") {
            for level in levels.split(',') {
                state.feature_levels.bump(level.trim());
            }
        }
    } else if let Some(level) = scan::value_after(line, "pFeatureLevels = &", ",") {
        state.feature_levels.bump(level);
    }
}

fn swapchain_parameters(state: &mut ParseState, line: &str) {
    if line.contains("pDesc = NULL") || line.contains("pSwapChainDesc = NULL") {
        return;
    }

    let anchor = if line.contains(SWAPCHAIN_PARAMETERS_IDENTIFIER) {
        SWAPCHAIN_PARAMETERS_IDENTIFIER
    } else {
        SWAPCHAIN_PARAMETERS_IDENTIFIER_2
    };
    let end = if line.contains(SWAPCHAIN_PARAMETERS_IDENTIFIER_END) {
        SWAPCHAIN_PARAMETERS_IDENTIFIER_END
    } else {
        SWAPCHAIN_PARAMETERS_IDENTIFIER_END_2
    };

    let Some(body) = scan::value_after(line, anchor, end) else {
        return;
    };

    // Flatten the nested sample descriptor into the outer delimiter before
    // splitting into key/value pairs.
    let flattened = body.replace(['{', '}'], ",");

    for parameter in flattened.split(',') {
        let parameter = parameter.trim();
        let Some((key, value)) = parameter.split_once(" = ") else {
            continue;
        };
        if !SWAPCHAIN_PARAMETERS_CAPTURED.contains(&key) || value == "0x0" {
            continue;
        }
        match key {
            "BufferUsage" => {
                for flag in value.split('|') {
                    state.swapchain_buffer_usage.bump(flag.trim());
                }
            }
            "Flags" => {
                for flag in value.split('|') {
                    state.swapchain_flags.bump(flag.trim());
                }
            }
            // Count and Quality live in the nested sample descriptor and need
            // the qualifier to stay unambiguous.
            "Count" | "Quality" => {
                state
                    .swapchain_parameters
                    .bump(format!("SampleDesc {parameter}"));
            }
            _ => state.swapchain_parameters.bump(parameter),
        }
    }
}

fn rastizer_state(state: &mut ParseState, line: &str) {
    if let Some(body) = scan::value_after(line, RASTIZER_STATE_IDENTIFIER, "}") {
        for entry in body.split(',') {
            let entry = entry.trim();
            let Some((key, _value)) = entry.split_once(" = ") else {
                continue;
            };
            if !RASTIZER_STATE_SKIPPED.contains(&key) {
                state.rastizer_states.bump(entry);
            }
        }
    }
}

fn blend_state(state: &mut ParseState, line: &str) {
    let Some(start) = line.find(BLEND_STATE_IDENTIFIER) else {
        return;
    };
    let rest = &line[start + BLEND_STATE_IDENTIFIER.len()..];

    // The description ends at the per-target array, whose field name differs
    // between the two API revisions; try the D3D11 spelling first.
    let body = match rest
        .find(BLEND_STATE_IDENTIFIER_END_D3D11)
        .or_else(|| rest.find(BLEND_STATE_IDENTIFIER_END_D3D10))
    {
        Some(end) => &rest[..end],
        None => rest,
    };

    for entry in body.split(',') {
        state.blend_states.bump(entry.trim());
    }
}

fn generic_create(state: &mut ParseState, line: &str) {
    if let Some(format) = scan::value_after(line, "Format = ", ",") {
        // at times the format value can end in a '},' block
        state.formats.bump(format.replace('}', ""));
    }

    if let Some(usage) = scan::value_after(line, "Usage = ", ",") {
        let usage = usage.replace('}', "");
        if !usage.contains(USAGE_SKIP_IDENTIFIER) {
            state.usage.bump(usage);
        }
    }

    if line.contains("BindFlags = ") && !line.contains("BindFlags = 0x0") {
        if let Some(flags) = scan::value_after(line, "BindFlags = ", ",") {
            for flag in flags.split('|') {
                state.bind_flags.bump(flag.trim());
            }
        }
    }
}
