//! Search settings.
//!
//! Applications provide these to tune defaults that a [`SearchConfig`] coming
//! from a client may leave unset. Settings are plain serde data and can be
//! embedded in a larger application config or loaded from a TOML file.
//!
//! ```toml
//! default_page_size = 25
//! ```
//!
//! [`SearchConfig`]: https://docs.rs/facetry-query/latest/facetry_query/struct.SearchConfig.html

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Page size used when a search config does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Tunable defaults for the search orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Results per page when the config carries none.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

impl SearchSettings {
    /// Parse settings from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::parse(format!("Invalid settings TOML: {e}")))
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml_str(&content)
    }
}

// ============================================================================
// Tests
// ============================================================================
