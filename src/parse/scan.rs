//! Positional-substring field extraction over trace dump lines.
//!
//! apitrace prints call arguments as `Name = value` pairs separated by commas
//! and closed by `)` or `}`. Extraction locates an anchor, advances past it,
//! and reads up to a terminator. Anchor scanning keeps the hot path free of
//! allocations and regular expressions.

/// Slice of `line` following the first occurrence of `anchor`, up to (not
/// including) the first occurrence of `end` after the anchor, trimmed.
///
/// Returns `None` when the anchor is absent; falls back to the rest of the
/// line when the terminator is absent.
#[must_use]
pub fn value_after<'a>(line: &'a str, anchor: &str, end: &str) -> Option<&'a str> {
    let start = line.find(anchor)? + anchor.len();
    let rest = &line[start..];
    let value = match rest.find(end) {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    Some(value.trim())
}

/// Like [`value_after`], but anchored on the last occurrence of `anchor`.
///
/// Surface locks carry two `dwFlags` pairs; the rightmost one describes the
/// lock itself.
#[must_use]
pub fn value_after_last<'a>(line: &'a str, anchor: &str, end: &str) -> Option<&'a str> {
    let start = line.rfind(anchor)? + anchor.len();
    let rest = &line[start..];
    let value = match rest.find(end) {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    Some(value.trim())
}

/// [`value_after`] with a fallback terminator, for values that usually end on
/// a comma but sit last in the argument list on some calls.
#[must_use]
pub fn value_after_either<'a>(
    line: &'a str,
    anchor: &str,
    end: &str,
    fallback_end: &str,
) -> Option<&'a str> {
    let start = line.find(anchor)? + anchor.len();
    let rest = &line[start..];
    let value = match rest.find(end).or_else(|| rest.find(fallback_end)) {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    Some(value.trim())
}

/// Parse an unsigned integer, accepting both decimal and `0x` hex spellings.
#[must_use]
pub fn parse_u64(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}
