//! Aggregation and JSON emission of per-trace results.
//!
//! Serialization is shape-stable: struct fields are declared in alphabetical
//! order and all counters are backed by sorted maps, so the artifact comes
//! out with alphabetically sorted keys, 4-space indentation and non-ASCII
//! preserved. Empty categories are omitted entirely; presence is signal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TraceStatsError;
use crate::parse::state::{Counter, ParseState};

/// Names derived from a trace file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceNames {
    /// Stem before cosmetic cleanup; the side table and override keys.
    pub raw: String,
    /// Cleaned-up binary name used in the export.
    pub binary_name: String,
    /// Whether the input is a `.zst` compressed trace.
    pub compressed: bool,
    /// Where the decompressed trace lands for compressed inputs.
    pub decompressed_path: PathBuf,
}

impl TraceNames {
    /// Derive names from a trace path.
    ///
    /// The stem drops the last extension, and for `.zst` inputs the `.trace`
    /// extension below it. Binaries renamed to the generic `game`/`Game.exe`
    /// pattern are truncated to their first four characters; trailing
    /// underscores (multi-edition or multi-API captures) are stripped.
    #[must_use]
    pub fn derive(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), ext.to_string()),
            None => (file_name.clone(), String::new()),
        };

        let compressed = extension == "zst";
        let decompressed_path = path.with_extension("");

        let raw = if compressed {
            match stem.rsplit_once('.') {
                Some((inner, _)) => inner.to_string(),
                None => stem,
            }
        } else {
            stem
        };

        let binary_name = if raw.to_uppercase().starts_with("GAME") {
            raw.get(..4).unwrap_or(&raw).to_string()
        } else if raw.ends_with('_') {
            raw.trim_end_matches('_').to_string()
        } else {
            raw.clone()
        };

        Self {
            raw,
            binary_name,
            compressed,
            decompressed_path,
        }
    }

    /// The stem used for single-input default export file names.
    #[must_use]
    pub fn export_stem(&self) -> &str {
        &self.raw
    }
}

/// One trace's summary, immutable once built.
///
/// Field order is alphabetical; together with the sorted counter maps this
/// fixes the serialized key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub api_calls: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub behavior_flags: Counter,
    pub binary_name: String,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub bind_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub blend_states: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub cooperative_level_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub device_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub device_types: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub feature_levels: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub flip_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub formats: Counter,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub lock_flags: Counter,
    pub name: String,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub pools: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub present_parameter_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub present_parameters: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub query_types: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub rastizer_states: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub render_states: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub shader_versions: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub surface_caps: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub swapchain_buffer_usage: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub swapchain_flags: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub swapchain_parameters: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub usage: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub vendor_hack_checks: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub vendor_hacks: Counter,
    #[serde(skip_serializing_if = "Counter::is_empty", default)]
    pub vertex_buffer_caps: Counter,
}

impl TraceResult {
    /// Assemble a result from the finalized parse state.
    #[must_use]
    pub fn from_state(
        state: ParseState,
        binary_name: String,
        name: String,
        link: Option<String>,
    ) -> Self {
        Self {
            api_calls: state.api_calls,
            behavior_flags: state.behavior_flags,
            binary_name,
            bind_flags: state.bind_flags,
            blend_states: state.blend_states,
            cooperative_level_flags: state.cooperative_level_flags,
            device_flags: state.device_flags,
            device_types: state.device_types,
            feature_levels: state.feature_levels,
            flip_flags: state.flip_flags,
            formats: state.formats,
            link,
            lock_flags: state.lock_flags,
            name,
            pools: state.pools,
            present_parameter_flags: state.present_parameter_flags,
            present_parameters: state.present_parameters,
            query_types: state.query_types,
            rastizer_states: state.rastizer_states,
            render_states: state.render_states,
            shader_versions: state.shader_versions,
            surface_caps: state.surface_caps,
            swapchain_buffer_usage: state.swapchain_buffer_usage,
            swapchain_flags: state.swapchain_flags,
            swapchain_parameters: state.swapchain_parameters,
            usage: state.usage,
            vendor_hack_checks: state.vendor_hack_checks,
            vendor_hacks: state.vendor_hacks,
            vertex_buffer_caps: state.vertex_buffer_caps,
        }
    }
}

/// The top-level export document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportDoc {
    pub tracestats: Vec<TraceResult>,
}

/// Serialize the document with 4-space indentation and UTF-8 passthrough.
pub fn to_json_pretty(doc: &ExportDoc) -> Result<String, TraceStatsError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    doc.serialize(&mut serializer)
        .map_err(|err| TraceStatsError::Internal(format!("JSON serialization failed: {err}")))?;
    String::from_utf8(buffer)
        .map_err(|err| TraceStatsError::Internal(format!("JSON serialization failed: {err}")))
}

/// Write the export artifact, backing up any prior artifact as `*.bak`.
pub fn write_export(path: &Path, doc: &ExportDoc) -> Result<(), TraceStatsError> {
    let json = to_json_pretty(doc)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if path.exists() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        match std::fs::copy(path, &backup) {
            Ok(_) => info!("Existing JSON export backed up as: {}", backup.display()),
            Err(err) => warn!("Unable to back up existing export: {err}"),
        }
    }

    std::fs::write(path, json)?;
    info!("JSON export complete");
    Ok(())
}

/// Join mode: concatenate the `tracestats` arrays of every JSON export in
/// `export_dir`, in sorted file order, into a single document at `output`.
pub fn join_exports(export_dir: &Path, output: &Path) -> Result<(), TraceStatsError> {
    let mut export_paths: Vec<PathBuf> = std::fs::read_dir(export_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    export_paths.sort();

    let mut doc = ExportDoc::default();
    for path in export_paths {
        info!(
            "Processing {} for joining...",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        let contents = std::fs::read_to_string(&path)?;
        let parsed: ExportDoc = serde_json::from_str(&contents)
            .map_err(|_| TraceStatsError::JoinParse(path.clone()))?;
        doc.tracestats.extend(parsed.tracestats);
    }

    let json = to_json_pretty(&doc)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, json)?;
    info!("Joined JSON export complete");
    Ok(())
}
