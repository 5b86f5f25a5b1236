//! Parser state owned by the classifier for the duration of one trace.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Graphics API detected from a trace's entry call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    D3D7,
    D3D8,
    D3D9,
    D3D9Ex,
    D3D10,
    D3D11,
    Dxgi,
}

impl Api {
    /// The canonical wire spelling, as used in exports and skip filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D3D7 => "D3D7",
            Self::D3D8 => "D3D8",
            Self::D3D9 => "D3D9",
            Self::D3D9Ex => "D3D9Ex",
            Self::D3D10 => "D3D10",
            Self::D3D11 => "D3D11",
            Self::Dxgi => "DXGI",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Api {
    type Err = String;

    /// Case-insensitive parse, so skip filters can be given as `d3d9ex`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "D3D7" => Ok(Self::D3D7),
            "D3D8" => Ok(Self::D3D8),
            "D3D9" => Ok(Self::D3D9),
            "D3D9EX" => Ok(Self::D3D9Ex),
            "D3D10" => Ok(Self::D3D10),
            "D3D11" => Ok(Self::D3D11),
            "DXGI" => Ok(Self::Dxgi),
            other => Err(format!("unknown API: {other}")),
        }
    }
}

/// Frequency counter mapping a stringified key to a strictly positive count.
///
/// Backed by a `BTreeMap` so that serialization yields alphabetically sorted
/// keys without a separate sorting pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counter(BTreeMap<String, u64>);

impl Counter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `key`, inserting it at 1 if unseen.
    pub fn bump(&mut self, key: impl Into<String>) {
        *self.0.entry(key.into()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Counter {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Shader parsing context across consecutive lines.
///
/// A shader creation call is followed by its disassembly on subsequent lines;
/// the version token is only meaningful while inside such a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderContext {
    #[default]
    Neutral,
    InShaderCall,
}

/// Mutable classifier state for a single trace.
///
/// Exclusively owned by the classifier thread while a trace is being parsed;
/// the aggregator takes ownership after the thread joins. A fresh value is
/// constructed per trace rather than resetting fields in place.
#[derive(Debug, Default)]
pub struct ParseState {
    /// Detected API; set at most once per trace.
    pub api: Option<Api>,
    /// Shader disassembly context state machine.
    pub shader_ctx: ShaderContext,
    /// Call index of the most recent numbered line.
    pub call_index: u64,
    /// Whether the non-monotonic call index warning already fired.
    pub monotonic_warned: bool,
    /// Call indices queued for the shader blob dump pass.
    pub shader_dump_calls: Vec<String>,

    pub api_calls: Counter,
    pub vendor_hack_checks: Counter,
    pub device_types: Counter,
    pub behavior_flags: Counter,
    pub present_parameters: Counter,
    pub present_parameter_flags: Counter,
    pub render_states: Counter,
    pub query_types: Counter,
    pub lock_flags: Counter,
    pub shader_versions: Counter,
    pub formats: Counter,
    pub vendor_hacks: Counter,
    pub pools: Counter,
    pub device_flags: Counter,
    pub swapchain_parameters: Counter,
    pub swapchain_buffer_usage: Counter,
    pub swapchain_flags: Counter,
    pub feature_levels: Counter,
    pub rastizer_states: Counter,
    pub blend_states: Counter,
    pub usage: Counter,
    pub bind_flags: Counter,
    pub cooperative_level_flags: Counter,
    pub flip_flags: Counter,
    pub surface_caps: Counter,
    pub vertex_buffer_caps: Counter,
}

impl ParseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
