//! Extraction rules for D3D8, D3D9 and D3D9Ex traces.

use tracing::warn;

use crate::parse::scan;
use crate::parse::shader::{self, ShaderFamily};
use crate::parse::state::{Api, ParseState};
use crate::parse::vendor;
use crate::parse::JobContext;

const CHECK_DEVICE_FORMAT_CALL: &str = "::CheckDeviceFormat";
const DEVICE_CREATION_CALL: &str = "::CreateDevice";
const RENDER_STATES_CALL: &str = "::SetRenderState";
const QUERY_TYPE_CALL_D3D8: &str = "::GetInfo";
const QUERY_TYPE_CALL_D3D9: &str = "::CreateQuery";
const LOCK_FLAGS_CALL: &str = "::Lock";
const CREATE_BASE_CALL: &str = "::Create";

const CHECK_DEVICE_FORMAT_IDENTIFIER: &str = "CheckFormat = ";
const LOCK_FLAGS_VALUE_IDENTIFIER: &str = "D3DLOCK_";
const USAGE_VALUE_IDENTIFIER: &str = "D3DUSAGE_";

// Star Wars: Force Unleashed (2) will set RS = -1 to 1 for some reason...
// Gun Metal will set RS 99, which is undefined...
const RENDER_STATES_SKIPPED: &[&str] = &["-1", "99"];

/// Present parameter keys that carry window geometry rather than driver
/// behavior; Flags is handled separately.
const PRESENT_PARAMETERS_SKIPPED: &[&str] = &[
    "Flags",
    "BackBufferWidth",
    "BackBufferHeight",
    "hDeviceWindow",
    "Windowed",
    "FullScreen_RefreshRateInHz",
];

pub fn extract(
    state: &mut ParseState,
    job: &JobContext,
    line: &str,
    call: &str,
    shader_line: bool,
) {
    if call.contains(CHECK_DEVICE_FORMAT_CALL) {
        check_device_format(state, line);
    } else if call.contains(DEVICE_CREATION_CALL) {
        create_device(state, line);
    } else if call.contains(RENDER_STATES_CALL) {
        set_render_state(state, line);
    } else if state.api == Some(Api::D3D8) && call.contains(QUERY_TYPE_CALL_D3D8) {
        // D3D8 uses IDirect3DDevice8::GetInfo calls to initiate queries
        if let Some(value) = scan::value_after(line, "DevInfoID = ", ",") {
            state.query_types.bump(d3d8_query_type(value));
        }
    } else if matches!(state.api, Some(Api::D3D9 | Api::D3D9Ex))
        && call.contains(QUERY_TYPE_CALL_D3D9)
    {
        if let Some(query_type) = scan::value_after(line, "Type = ", ",") {
            state.query_types.bump(query_type);
        }
    } else if call.contains(LOCK_FLAGS_CALL) {
        lock_flags(state, line);
    } else if shader::is_shader_call(call, ShaderFamily::D3d9) || shader_line {
        shader::observe(state, job, line, call, shader_line, ShaderFamily::D3d9);
    } else if call.contains(CREATE_BASE_CALL) {
        generic_create(state, line);
    }
}

/// Decode a D3D8 `DevInfoID` value; these aren't usually included in any headers.
fn d3d8_query_type(value: &str) -> &'static str {
    match value.parse::<u32>() {
        Ok(1) => "D3DDEVINFOID_TEXTUREMANAGER",
        Ok(2) => "D3DDEVINFOID_D3DTEXTUREMANAGER",
        Ok(3) => "D3DDEVINFOID_TEXTURING",
        Ok(4) => "D3DDEVINFOID_VCACHE",
        Ok(5) => "D3DDEVINFOID_RESOURCEMANAGER",
        Ok(6) => "D3DDEVINFOID_VERTEXSTATS",
        _ => "Unknown",
    }
}

fn check_device_format(state: &mut ParseState, line: &str) {
    let Some(value) = scan::value_after(line, CHECK_DEVICE_FORMAT_IDENTIFIER, ")") else {
        return;
    };

    // Decoded D3DFORMAT names (regular CheckDeviceFormat queries) are skipped;
    // only raw numeric values can carry a vendor hack.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return;
    }

    if let Some(name) = vendor::vendor_hack_name(value) {
        state
            .vendor_hack_checks
            .bump(format!("{CHECK_DEVICE_FORMAT_IDENTIFIER}{name}"));
    } else if let Some(numeric) = scan::parse_u64(value) {
        if numeric > 0 {
            if let Some(potential) = vendor::detect_potential_vendor_hack(numeric, line) {
                if !vendor::KNOWN_FOURCC_FORMATS.contains(&potential.as_str()) {
                    warn!("Detected a check for a FOURCC/potential vendor hack value: {potential}");
                }
            }
        }
    }
}

fn create_device(state: &mut ParseState, line: &str) {
    if let Some(device_type) = scan::value_after(line, "DeviceType = ", ",") {
        state.device_types.bump(device_type);
    }

    if let Some(flags) = scan::value_after(line, "BehaviorFlags = ", ",") {
        for flag in flags.split('|') {
            state.behavior_flags.bump(flag.trim());
        }
    }

    if line.contains("pPresentationParameters = ?") {
        return;
    }

    if !line.contains(", Flags = 0x0") {
        if let Some(flags) = scan::value_after(line, ", Flags = ", ",") {
            for flag in flags.split('|') {
                state.present_parameter_flags.bump(flag.trim());
            }
        }
    }

    if let Some(body) = scan::value_after(line, "pPresentationParameters = &{", "}") {
        for parameter in body.split(',') {
            let parameter = parameter.trim();
            let Some((key, _value)) = parameter.split_once(" = ") else {
                continue;
            };
            if !PRESENT_PARAMETERS_SKIPPED.contains(&key) {
                state.present_parameters.bump(parameter);
            }
        }
    }
}

fn set_render_state(state: &mut ParseState, line: &str) {
    if let Some(render_state) = scan::value_after(line, "State = ", ",") {
        if !RENDER_STATES_SKIPPED.contains(&render_state) {
            state.render_states.bump(render_state);
        }
    }

    let vendor_hack_state = if line.contains(vendor::POINTSIZE_STATE) {
        Some("D3DRS_POINTSIZE")
    } else if line.contains("State = D3DRS_ADAPTIVETESS_X,") {
        Some("D3DRS_ADAPTIVETESS_X")
    } else if line.contains("State = D3DRS_ADAPTIVETESS_Y,") {
        Some("D3DRS_ADAPTIVETESS_Y")
    } else {
        None
    };

    let Some(vendor_hack_state) = vendor_hack_state else {
        return;
    };
    let Some(value) = scan::value_after(line, "Value = ", ")") else {
        return;
    };

    if let Some(name) = vendor::vendor_hack_name(value) {
        state
            .vendor_hacks
            .bump(format!("{vendor_hack_state} = {name}"));
    } else if let Some(numeric) = scan::parse_u64(value) {
        if numeric > 0 {
            if let Some(potential) = vendor::detect_potential_vendor_hack(numeric, line) {
                warn!("Detected a potential vendor hack value: {potential}");
            }
        }
    }
}

fn lock_flags(state: &mut ParseState, line: &str) {
    if line.contains("Flags = 0x0") {
        return;
    }
    let Some(flags) = scan::value_after(line, "Flags = ", ")") else {
        return;
    };
    for flag in flags.split('|') {
        let flag = flag.trim();
        // Mafia sets several bogus lock values (not part of the enum)
        if flag.starts_with(LOCK_FLAGS_VALUE_IDENTIFIER) {
            state.lock_flags.bump(flag);
        }
    }
}

fn generic_create(state: &mut ParseState, line: &str) {
    if let Some(format) = scan::value_after(line, "Format = ", ",") {
        state.formats.bump(format);
    }

    if line.contains("Usage = ") && !line.contains("Flags = 0x0") {
        // Usage values usually end on a comma; in D3D8 they are also included
        // in CreateVertexShader calls, at the end of the parameter list.
        if let Some(values) = scan::value_after_either(line, "Usage = ", ",", ")") {
            for value in values.split('|') {
                let value = value.trim();
                if value.starts_with(USAGE_VALUE_IDENTIFIER) {
                    state.usage.bump(value);
                }
            }
        }
    }

    if let Some(pool) = scan::value_after(line, "Pool = ", ",") {
        state.pools.bump(pool);
    }
}
