//! Static dispatch tables for API detection and per-binary overrides.

use crate::parse::state::Api;

/// Entry calls in match order.
///
/// The lookup is a substring scan, so `Direct3DCreate9Ex` must precede
/// `Direct3DCreate9` and the longer D3D10/D3D11 creation variants must
/// precede their shorter prefixes. This ordering is a contract.
pub const API_ENTRY_CALLS: &[(&str, Api)] = &[
    ("DirectDrawCreateEx", Api::D3D7),
    ("Direct3DCreate8", Api::D3D8),
    ("Direct3DCreate9Ex", Api::D3D9Ex),
    ("Direct3DCreate9", Api::D3D9),
    ("D3D10CreateDeviceAndSwapChain1", Api::D3D10),
    ("D3D10CreateDevice1", Api::D3D10),
    ("D3D10CreateDeviceAndSwapChain", Api::D3D10),
    ("D3D10CreateDevice", Api::D3D10),
    ("D3D10CoreCreateDevice", Api::D3D10),
    ("D3D11CreateDeviceAndSwapChain", Api::D3D11),
    ("D3D11CreateDevice", Api::D3D11),
    ("D3D11CoreCreateDevice", Api::D3D11),
];

/// Calls that qualify a line as an API call even without a `::` scope marker.
///
/// These are the entry calls plus the DirectDraw enumeration helper and the
/// DXGI factory creation functions.
pub const API_BASE_CALLS: &[&str] = &[
    "DirectDrawCreateEx",
    "Direct3DCreate8",
    "Direct3DCreate9Ex",
    "Direct3DCreate9",
    "D3D10CreateDeviceAndSwapChain1",
    "D3D10CreateDevice1",
    "D3D10CreateDeviceAndSwapChain",
    "D3D10CreateDevice",
    "D3D10CoreCreateDevice",
    "D3D11CreateDeviceAndSwapChain",
    "D3D11CreateDevice",
    "D3D11CoreCreateDevice",
    "DirectDrawEnumerateExA",
    "CreateDXGIFactory",
    "CreateDXGIFactory1",
    "CreateDXGIFactory2",
];

/// Per-binary API overrides for applications whose first device creation does
/// not match the API they render with.
pub const TRACE_API_OVERRIDES: &[(&str, Api)] = &[
    // Ignore queries done on a plain D3D9 interface, as it's not used for rendering
    ("wargame_", Api::D3D9Ex),
    // Creates a D3D11 device first, but renders using D3D10
    ("xrEngine___", Api::D3D10),
    // Creates a D3D10 device first, but renders using D3D11
    ("RebelGalaxy", Api::D3D11),
];

/// Look up the API override for a raw binary stem, if any.
#[must_use]
pub fn api_override(binary_name_raw: &str) -> Option<Api> {
    TRACE_API_OVERRIDES
        .iter()
        .find(|(name, _)| *name == binary_name_raw)
        .map(|(_, api)| *api)
}

/// Detect the entry API from a call token by scanning the ordered table.
#[must_use]
pub fn detect_entry_api(call_token: &str) -> Option<Api> {
    API_ENTRY_CALLS
        .iter()
        .find(|(name, _)| call_token.contains(name))
        .map(|(_, api)| *api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d3d9ex_precedes_d3d9() {
        let ex = API_ENTRY_CALLS
            .iter()
            .position(|(n, _)| *n == "Direct3DCreate9Ex")
            .unwrap();
        let plain = API_ENTRY_CALLS
            .iter()
            .position(|(n, _)| *n == "Direct3DCreate9")
            .unwrap();
        assert!(ex < plain, "D3D9Ex entry must be checked before D3D9");
    }

    #[test]
    fn test_longer_d3d10_variants_precede_shorter() {
        let positions: Vec<usize> = [
            "D3D10CreateDeviceAndSwapChain1",
            "D3D10CreateDevice1",
            "D3D10CreateDeviceAndSwapChain",
            "D3D10CreateDevice",
        ]
        .iter()
        .map(|name| {
            API_ENTRY_CALLS
                .iter()
                .position(|(n, _)| n == name)
                .unwrap()
        })
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_detect_entry_api_precedence() {
        assert_eq!(
            detect_entry_api("Direct3DCreate9Ex(SDKVersion = 32)"),
            Some(Api::D3D9Ex)
        );
        assert_eq!(
            detect_entry_api("Direct3DCreate9(SDKVersion = 32)"),
            Some(Api::D3D9)
        );
        assert_eq!(
            detect_entry_api("D3D11CreateDeviceAndSwapChain(pAdapter = NULL"),
            Some(Api::D3D11)
        );
        assert_eq!(detect_entry_api("IDirect3DDevice9::Present("), None);
    }

    #[test]
    fn test_api_override_lookup() {
        assert_eq!(api_override("wargame_"), Some(Api::D3D9Ex));
        assert_eq!(api_override("RebelGalaxy"), Some(Api::D3D11));
        assert_eq!(api_override("quake3"), None);
    }
}
