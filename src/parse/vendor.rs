//! Vendor-hack value decoding.
//!
//! Several D3D8/D3D9 era drivers accepted out-of-band signals through format
//! checks and render state values: a FOURCC (or a sentinel integer) passed
//! where the API does not expect a real format. The fixed table below maps
//! the known sentinel values to their marker names.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Render state anchor that gates the ATI/AMD configuration value range.
pub const POINTSIZE_STATE: &str = "State = D3DRS_POINTSIZE,";

/// Known vendor hack sentinel values, keyed by their decimal spelling.
///
/// To convert, use `u32::from_le_bytes(*b"ATOC")` or
/// `1129272385u32.to_le_bytes()`.
static VENDOR_HACK_VALUES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("1515406674", "RESZ"),        // This is the FOURCC
        ("2141212672", "RESZ_ENABLE"), // This is the enable value, not the FOURCC
        ("1414745673", "INST"),
        ("827142721", "A2M1"),
        ("810365505", "A2M0"),
        // not actually used in conjunction with render states, but will be checked for support
        ("1112945234", "R2VB"),
        // undocumented ATI/Nvidia centroid hack (alternate pixel center)
        ("1414415683", "CENT"),
        // Nvidia fast Z reject hack used by older Source engine builds
        ("1093815368", "HL2A"),
        // game-specific hacks
        ("826953539", "COJ1"),  // Call of Juarez
        ("808931924", "TR70"),  // Tomb Raider: Anniversary / Legend
        ("1162692948", "TIME"), // TimeShift
        ("1282302283", "KanL"), // Kane & Lynch (2)
        ("1129272385", "ATOC"),
        ("1094800211", "SSAA"),
        ("1297108803", "COPM"),
        ("1111774798", "NVDB"),
    ])
});

/// FOURCC formats that legitimately show up in format capability checks.
pub const KNOWN_FOURCC_FORMATS: &[&str] = &[
    // Checked by D3D9 SAGE engine games
    "EXT1", "FXT1", "GXT1", "HXT1",
    // Checked by various D3D8 and D3D9 games
    "AL16", "AR16", " R16", " L16",
    // FOURCCs specific to Freelancer
    "DAA1", "DAA8", "DAOP", "DAOT",
];

/// Look up a known vendor hack marker by its decimal value string.
#[must_use]
pub fn vendor_hack_name(value: &str) -> Option<&'static str> {
    VENDOR_HACK_VALUES.get(value).copied()
}

/// Decode a value as a 4-byte little-endian ASCII FOURCC.
fn decode_fourcc(value: u64) -> Option<String> {
    let value = u32::try_from(value).ok()?;
    let bytes = value.to_le_bytes();
    if !bytes.iter().all(u8::is_ascii) {
        return None;
    }
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Classify an unexpected integer as a potential vendor hack.
///
/// Values between 0x7fa00000 and 0x7fa10000 observed as a `D3DRS_POINTSIZE`
/// value fall in a range ATI/AMD used to enable, disable and configure all
/// sorts of behavior; those are reported as hex strings. Other values are
/// reported only when they decode to an alphanumeric FOURCC (allowing for
/// leading whitespace, as in ` R16`).
#[must_use]
pub fn detect_potential_vendor_hack(value: u64, line: &str) -> Option<String> {
    if line.contains(POINTSIZE_STATE) && value > 0x7fa0_0000 && value < 0x7fa1_0000 {
        return Some(format!("{value:#x}"));
    }

    let fourcc = decode_fourcc(value)?;
    let trimmed = fourcc.trim();
    if !trimmed.is_empty() && trimmed.chars().all(char::is_alphanumeric) {
        Some(fourcc)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_hack_table_lookups() {
        assert_eq!(vendor_hack_name("1515406674"), Some("RESZ"));
        assert_eq!(vendor_hack_name("2141212672"), Some("RESZ_ENABLE"));
        assert_eq!(vendor_hack_name("1129272385"), Some("ATOC"));
        assert_eq!(vendor_hack_name("1111774798"), Some("NVDB"));
        assert_eq!(vendor_hack_name("42"), None);
    }

    #[test]
    fn test_fourcc_roundtrip() {
        // "ATOC" little-endian
        assert_eq!(decode_fourcc(1_129_272_385), Some("ATOC".to_string()));
        // " R16" keeps its leading whitespace
        assert_eq!(
            decode_fourcc(u64::from(u32::from_le_bytes(*b" R16"))),
            Some(" R16".to_string())
        );
        // Non-ASCII bytes fail the decode
        assert_eq!(decode_fourcc(0xFF00_0000), None);
        // Values beyond u32 cannot be FOURCCs
        assert_eq!(decode_fourcc(u64::MAX), None);
    }

    #[test]
    fn test_pointsize_range_reports_hex() {
        let line = "7 IDirect3DDevice9::SetRenderState(State = D3DRS_POINTSIZE, Value = 2141192193)";
        assert_eq!(
            detect_potential_vendor_hack(2_141_192_193, line),
            Some("0x7fa00001".to_string())
        );
        // The range bounds themselves are excluded
        assert_eq!(detect_potential_vendor_hack(0x7fa0_0000, line), None);
        assert_eq!(detect_potential_vendor_hack(0x7fa1_0000, line), None);
    }

    #[test]
    fn test_range_requires_pointsize_anchor() {
        let line = "7 IDirect3DDevice9::SetRenderState(State = D3DRS_ADAPTIVETESS_X, Value = 2141192193)";
        // Outside the POINTSIZE context the range check does not apply and the
        // value does not decode to an alphanumeric FOURCC.
        assert_eq!(detect_potential_vendor_hack(2_141_192_193, line), None);
    }

    #[test]
    fn test_fourcc_detection_requires_alnum() {
        let line = "7 IDirect3DDevice9::SetRenderState(State = D3DRS_POINTSIZE, Value = 1)";
        // 0x00000001 decodes to control characters
        assert_eq!(detect_potential_vendor_hack(1, line), None);
        // "GET4" style FOURCC decodes cleanly
        let get4 = u64::from(u32::from_le_bytes(*b"GET4"));
        assert_eq!(
            detect_potential_vendor_hack(get4, line),
            Some("GET4".to_string())
        );
    }
}
