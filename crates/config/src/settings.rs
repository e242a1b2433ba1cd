// Grid settings
// Loaded from ~/.config/taskgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{config_dir, strip_line_comments, ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Rendering
    /// Height assumed for rows that have not been measured yet.
    #[serde(rename = "grid.estimatedRowHeight")]
    pub estimated_row_height: f32,

    /// Extra rows rendered above and below the viewport.
    #[serde(rename = "grid.overscan")]
    pub overscan: usize,

    /// Distance from the bottom (px) at which more rows are requested.
    #[serde(rename = "grid.loadMoreThreshold")]
    pub load_more_threshold: f32,

    /// Placeholder rows shown while a page of data is loading.
    #[serde(rename = "grid.placeholderRows")]
    pub placeholder_rows: usize,

    // Selection
    #[serde(rename = "selection.clickToDeselect")]
    pub click_to_deselect: bool,

    // Clipboard
    #[serde(rename = "clipboard.copyHeaders")]
    pub copy_headers: bool,

    #[serde(rename = "clipboard.fullRow")]
    pub copy_full_row: bool,

    // Editing
    /// Committing an edit applies the value to every selected cell in the same column.
    #[serde(rename = "editing.applyToSelection")]
    pub apply_edit_to_selection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            estimated_row_height: 34.0,
            overscan: 10,
            load_more_threshold: 200.0,
            placeholder_rows: 20,
            click_to_deselect: true,
            copy_headers: false,
            copy_full_row: true,
            apply_edit_to_selection: true,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        config_dir().join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&strip_line_comments(&contents)).map_err(|e| ConfigError::json(path, e))
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::json(path, e))?;
        fs::write(path, json).map_err(|e| ConfigError::io(path, e))
    }
}
