use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use taskgrid_core::columns::{ColumnState, RowPins};

use crate::{config_dir, ConfigError};

pub const SESSION_VERSION: u32 = 1;

/// Per-project grid view state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSession {
    pub version: u32,
    /// Row id -> expanded. Rows not listed are collapsed.
    pub expanded: BTreeMap<String, bool>,
    pub columns: ColumnState,
    pub pinned_rows: RowPins,
}

impl ViewSession {
    /// Get the sessions directory
    fn sessions_dir() -> PathBuf {
        config_dir().join("sessions")
    }

    /// Hash a project name to create a unique filename
    fn hash_project(project: &str) -> String {
        let mut hasher = DefaultHasher::new();
        project.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Session file path for a project
    pub fn path_for(project: &str) -> PathBuf {
        Self::sessions_dir().join(format!("{}.json", Self::hash_project(project)))
    }

    /// Load the saved session for a project, if any. Unreadable files are
    /// logged and ignored.
    pub fn load(project: &str) -> Option<Self> {
        let path = Self::path_for(project);
        if !path.exists() {
            return None;
        }
        match Self::load_from(&path) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("ignoring saved view session: {e}");
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ConfigError::json(path, e))
    }

    pub fn save(&self, project: &str) -> Result<(), ConfigError> {
        self.save_to(&Self::path_for(project))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let session = Self {
            version: SESSION_VERSION,
            ..self.clone()
        };
        let json = serde_json::to_string_pretty(&session).map_err(|e| ConfigError::json(path, e))?;
        fs::write(path, json).map_err(|e| ConfigError::io(path, e))
    }
}
