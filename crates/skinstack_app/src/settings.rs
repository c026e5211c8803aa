// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool settings.
//!
//! Settings live in a RON file next to the working directory:
//! - Rewire configuration (mesh plug names, rebuilt suffix)
//! - Host type name to node kind mapping
//! - Log filter directive
//! - Command port address and default rebuild mode

use serde::{Deserialize, Serialize};
use skinstack_deform::{RebuildMode, RewireConfig};
use skinstack_graph::KindTable;
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "skinstack.ron";

/// Errors loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File system error
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Settings parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("Settings write error: {0}")]
    Write(#[from] ron::Error),

    /// File written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest supported version
        supported: u32,
    },
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Format version
    pub version: u32,
    /// Rewire configuration
    pub rewire: RewireConfig,
    /// Host type names per node kind
    pub kinds: KindTable,
    /// Extra `tracing` filter directive
    pub log_filter: String,
    /// Address of the host command port, e.g. `127.0.0.1:7001`
    pub command_port: Option<String>,
    /// Rebuild mode a new session starts in
    pub default_mode: RebuildMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            rewire: RewireConfig::default(),
            kinds: KindTable::default(),
            log_filter: "info".to_string(),
            command_port: None,
            default_mode: RebuildMode::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
