//! Extraction rules for DDRAW7/D3D7 traces.

use crate::parse::scan;
use crate::parse::state::ParseState;

const COOPERATIVE_LEVEL_FLAGS_CALL: &str = "IDirectDraw7::SetCooperativeLevel";
const SURFACE_CAPS_CALL: &str = "IDirectDraw7::CreateSurface";
const VERTEX_BUFFER_CAPS_CALL: &str = "IDirect3D7::CreateVertexBuffer";
const FLIP_FLAGS_CALL: &str = "IDirectDrawSurface7::Flip";
const LOCK_FLAGS_SURFACE_CALL: &str = "IDirectDrawSurface7::Lock";
const LOCK_FLAGS_BUFFER_CALL: &str = "IDirect3DVertexBuffer7::Lock";
const RENDER_STATES_CALL: &str = "IDirect3DDevice7::SetRenderState";
const DEVICE_CREATION_CALL: &str = "IDirect3D7::CreateDevice";

const RENDER_STATES_IDENTIFIER: &str = "D3DRENDERSTATE_";
const LOCK_FLAGS_VALUE_IDENTIFIER: &str = "DDLOCK_";

/// Vertex buffer capability bits, which apitrace does not decode itself.
const VERTEX_BUFFER_CAP_MASKS: &[(u64, &str)] = &[
    (0x0000_0800, "D3DVBCAPS_SYSTEMMEMORY"),
    (0x0001_0000, "D3DVBCAPS_WRITEONLY"),
    (0x8000_0000, "D3DVBCAPS_OPTIMIZED"),
    (0x0000_0001, "D3DVBCAPS_DONOTCLIP"),
];

pub fn extract(state: &mut ParseState, line: &str, call: &str) {
    if call.contains(COOPERATIVE_LEVEL_FLAGS_CALL) {
        if let Some(flags) = scan::value_after(line, "dwFlags = ", ")") {
            for flag in flags.split('|') {
                state.cooperative_level_flags.bump(flag.trim());
            }
        }
    } else if call.contains(SURFACE_CAPS_CALL) {
        if !line.contains("dwCaps = 0x0") {
            if let Some(caps) = scan::value_after(line, "dwCaps = ", ",") {
                for cap in caps.split('|') {
                    state.surface_caps.bump(cap.trim());
                }
            }
        }
        if !line.contains("dwCaps2 = 0x0") {
            if let Some(caps) = scan::value_after(line, "dwCaps2 = ", ",") {
                for cap in caps.split('|') {
                    state.surface_caps.bump(cap.trim());
                }
            }
        }
    } else if call.contains(VERTEX_BUFFER_CAPS_CALL) {
        if !line.contains("dwCaps = 0x0") {
            if let Some(value) = scan::value_after(line, "dwCaps = ", ",") {
                if let Some(caps) = scan::parse_u64(value) {
                    for (mask, name) in VERTEX_BUFFER_CAP_MASKS {
                        if caps & mask != 0 {
                            state.vertex_buffer_caps.bump(*name);
                        }
                    }
                }
            }
        }
    } else if call.contains(FLIP_FLAGS_CALL) {
        if !line.contains("dwFlags = 0x0") {
            if let Some(flags) = scan::value_after(line, "dwFlags = ", ")") {
                for flag in flags.split('|') {
                    state.flip_flags.bump(flag.trim());
                }
            }
        }
    } else if call.contains(LOCK_FLAGS_SURFACE_CALL) || call.contains(LOCK_FLAGS_BUFFER_CALL) {
        // Surface locks carry two dwFlags pairs; the rightmost one describes
        // the lock itself.
        if !line.contains("dwFlags = 0x0") {
            if let Some(flags) = scan::value_after_last(line, "dwFlags = ", ",") {
                for flag in flags.split('|') {
                    let flag = flag.trim();
                    // Praetorians sets several bogus lock values (not part of the enum)
                    if flag.starts_with(LOCK_FLAGS_VALUE_IDENTIFIER) {
                        state.lock_flags.bump(flag);
                    }
                }
            }
        }
    } else if call.contains(RENDER_STATES_CALL) {
        if let Some(name) = scan::value_after(line, RENDER_STATES_IDENTIFIER, ",") {
            state
                .render_states
                .bump(format!("{RENDER_STATES_IDENTIFIER}{name}"));
        }
    } else if call.contains(DEVICE_CREATION_CALL) {
        if let Some(device_type) = scan::value_after(line, "rclsid = ", ",") {
            state.device_types.bump(device_type);
        }
    }
}
