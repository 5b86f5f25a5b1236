//! Optional side table mapping trace binary stems to application metadata.
//!
//! The table is a JSON file of the form:
//!
//! ```json
//! {
//!     "GameBinary_": { "name": "Game Title", "link": "https://…", "api": "D3D9" }
//! }
//! ```
//!
//! Its absence is not an error; every field of every entry is optional.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

/// Default side table file name, looked up in the working directory.
pub const DEFAULT_APPNAMES_FILE: &str = "traceappnames.json";

/// Metadata recorded for one traced binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppEntry {
    pub name: Option<String>,
    pub link: Option<String>,
    pub api: Option<String>,
}

/// Read-only application metadata lookup, keyed by raw binary stem.
#[derive(Debug, Default)]
pub struct AppNames {
    entries: HashMap<String, AppEntry>,
}

impl AppNames {
    /// Load the side table.
    ///
    /// An explicit path that cannot be read or parsed logs a warning and
    /// yields an empty table; the default path is only tried when present.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Path::new(DEFAULT_APPNAMES_FILE);
                if !default.is_file() {
                    return Self::default();
                }
                default.to_path_buf()
            }
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, AppEntry>>(&contents) {
                Ok(entries) => {
                    debug!(
                        "Loaded {} side table entries from {}",
                        entries.len(),
                        path.display()
                    );
                    Self { entries }
                }
                Err(err) => {
                    warn!("Unable to parse side table {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                warn!("Unable to read side table {}: {err}", path.display());
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn get(&self, binary_name_raw: &str) -> Option<&AppEntry> {
        self.entries.get(binary_name_raw)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
