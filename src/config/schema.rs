//! Settings schema for Freezer
//!
//! Settings are stored at `~/.config/freezer/config.toml`. Every field is
//! optional; command-line flags win over anything set here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// General settings
    pub general: GeneralSettings,

    /// Defaults for the stock command
    pub stock: StockSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl GeneralSettings {
    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Defaults applied to `freezer stock` when the matching flag is absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSettings {
    /// Cache root (defaults to `~/.freezer-cache`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<PathBuf>,

    /// GitHub API endpoint (defaults to `https://api.github.com`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_endpoint: Option<String>,
}
