// Keybinding configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{config_dir, strip_line_comments, ConfigError};

pub const COPY: &str = "edit.copy";
pub const PASTE: &str = "edit.paste";
pub const EDIT_CELL: &str = "cell.edit";
pub const CANCEL_EDIT: &str = "cell.cancelEdit";
pub const SELECT_ALL: &str = "select.all";
pub const INHERIT: &str = "cell.inheritFromParent";
pub const EXPORT_CSV: &str = "file.exportCsv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keybinding {
    pub key: String,
    pub command: String,
}

#[derive(Debug, Clone)]
pub struct KeybindingManager {
    // Maps normalized key combo -> command id
    bindings: HashMap<String, String>,
    // Maps command id -> key combo (for display)
    shortcuts: HashMap<String, String>,
}

impl Default for KeybindingManager {
    fn default() -> Self {
        let mut manager = Self {
            bindings: HashMap::new(),
            shortcuts: HashMap::new(),
        };
        manager.extend(default_keybindings());
        manager
    }
}

impl KeybindingManager {
    /// Defaults overlaid with the user's keybindings.json, if any.
    pub fn load() -> Self {
        let mut manager = Self::default();
        let path = Self::config_path();
        if path.exists() {
            if let Err(e) = manager.load_user_config(&path) {
                log::warn!("{e}; keeping default keybindings");
            }
        }
        manager
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("keybindings.json")
    }

    /// Overlay bindings from a JSON array of `{ "key", "command" }`.
    pub fn load_user_config(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let user: Vec<Keybinding> =
            serde_json::from_str(&strip_line_comments(&contents)).map_err(|e| ConfigError::json(path, e))?;
        self.extend(user);
        Ok(())
    }

    fn extend(&mut self, bindings: impl IntoIterator<Item = Keybinding>) {
        for binding in bindings {
            let key = normalize_key(&binding.key);
            if let Some(previous) = self.shortcuts.insert(binding.command.clone(), binding.key) {
                self.bindings.remove(&normalize_key(&previous));
            }
            self.bindings.insert(key, binding.command);
        }
    }

    /// Get command for a key combination
    pub fn command_for(&self, key: &str) -> Option<&str> {
        self.bindings.get(&normalize_key(key)).map(String::as_str)
    }

    /// Get shortcut display string for a command
    pub fn shortcut_for(&self, command: &str) -> Option<&str> {
        self.shortcuts.get(command).map(String::as_str)
    }
}

/// Normalize key string to canonical form: "ctrl+shift+alt+key".
///
/// `cmd`, `meta` and `super` fold into `ctrl` so one binding serves
/// Ctrl on Windows/Linux and Cmd on macOS.
pub fn normalize_key(key: &str) -> String {
    let key = key.to_lowercase();

    let mut has_ctrl = false;
    let mut has_shift = false;
    let mut has_alt = false;
    let mut main_key = "";

    for part in key.split('+') {
        match part.trim() {
            "ctrl" | "control" | "cmd" | "command" | "meta" | "super" => has_ctrl = true,
            "shift" => has_shift = true,
            "alt" | "option" => has_alt = true,
            other => main_key = other,
        }
    }

    let mut result = String::new();
    if has_ctrl {
        result.push_str("ctrl+");
    }
    if has_shift {
        result.push_str("shift+");
    }
    if has_alt {
        result.push_str("alt+");
    }
    result.push_str(main_key);
    result
}

pub fn default_keybindings() -> Vec<Keybinding> {
    let binding = |key: &str, command: &str| Keybinding {
        key: key.into(),
        command: command.into(),
    };
    vec![
        binding("ctrl+c", COPY),
        binding("ctrl+v", PASTE),
        binding("f2", EDIT_CELL),
        binding("escape", CANCEL_EDIT),
        binding("ctrl+a", SELECT_ALL),
        binding("ctrl+shift+i", INHERIT),
        binding("ctrl+shift+e", EXPORT_CSV),
    ]
}
