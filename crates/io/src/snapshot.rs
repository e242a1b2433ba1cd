//! Project snapshot: a JSON dump of one project's folders and tasks.
//!
//! ```json
//! { "name": "demo", "folders": [ ... ], "tasks": [ ... ] }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use taskgrid_engine::{Entity, EntityStore, Folder, Task};

use crate::IoError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProjectSnapshot {
    pub fn load(path: &Path) -> Result<Self, IoError> {
        let text = fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
        let snapshot: Self = serde_json::from_str(&text).map_err(|e| IoError::json(path, e))?;
        snapshot.check_ids()?;
        log::debug!(
            "loaded snapshot '{}': {} folders, {} tasks",
            snapshot.name,
            snapshot.folders.len(),
            snapshot.tasks.len()
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| IoError::json(path, e))?;
        fs::write(path, json).map_err(|e| IoError::io(path, e))
    }

    /// Folder and task ids share one namespace (they are grid row ids).
    fn check_ids(&self) -> Result<(), IoError> {
        let mut seen = HashSet::new();
        let ids = self
            .folders
            .iter()
            .map(|f| f.id.as_str())
            .chain(self.tasks.iter().map(|t| t.id.as_str()));
        for id in ids {
            if !seen.insert(id) {
                return Err(IoError::DuplicateId(id.to_string()));
            }
        }
        Ok(())
    }

    pub fn into_store(self) -> EntityStore {
        EntityStore::from_entities(
            self.folders
                .into_iter()
                .map(Entity::Folder)
                .chain(self.tasks.into_iter().map(Entity::Task)),
        )
    }
}
