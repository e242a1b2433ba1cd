//! Document-level shortcut binding.
//!
//! Copy and paste chords are bound for the whole document while a grid is
//! mounted. Binding returns a [`ShortcutGuard`]; dropping the guard unbinds.
//! When several grids are mounted only the most recently bound one handles
//! a chord, so no chord is ever handled twice.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use taskgrid_config::keybindings::{self, KeybindingManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridCommand {
    Copy,
    Paste,
    EditCell,
    CancelEdit,
    SelectAll,
    InheritFromParent,
    ExportCsv,
}

impl GridCommand {
    pub fn from_command_id(id: &str) -> Option<Self> {
        let command = match id {
            keybindings::COPY => GridCommand::Copy,
            keybindings::PASTE => GridCommand::Paste,
            keybindings::EDIT_CELL => GridCommand::EditCell,
            keybindings::CANCEL_EDIT => GridCommand::CancelEdit,
            keybindings::SELECT_ALL => GridCommand::SelectAll,
            keybindings::INHERIT => GridCommand::InheritFromParent,
            keybindings::EXPORT_CSV => GridCommand::ExportCsv,
            _ => return None,
        };
        Some(command)
    }

    pub fn command_id(self) -> &'static str {
        match self {
            GridCommand::Copy => keybindings::COPY,
            GridCommand::Paste => keybindings::PASTE,
            GridCommand::EditCell => keybindings::EDIT_CELL,
            GridCommand::CancelEdit => keybindings::CANCEL_EDIT,
            GridCommand::SelectAll => keybindings::SELECT_ALL,
            GridCommand::InheritFromParent => keybindings::INHERIT,
            GridCommand::ExportCsv => keybindings::EXPORT_CSV,
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    // bind order; last entry handles chords
    owners: Vec<u64>,
}

/// The document's shortcut table. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct DocumentShortcuts {
    registry: Rc<RefCell<Registry>>,
}

impl DocumentShortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self) -> ShortcutGuard {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.owners.push(id);
        log::debug!("bound document shortcuts for owner {id}");
        ShortcutGuard {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn bound_count(&self) -> usize {
        self.registry.borrow().owners.len()
    }

    /// Owner that currently handles chords.
    pub fn active_owner(&self) -> Option<u64> {
        self.registry.borrow().owners.last().copied()
    }

    /// Resolve a chord to `(owner, command)`.
    pub fn dispatch(&self, keys: &KeybindingManager, chord: &str) -> Option<(u64, GridCommand)> {
        let owner = self.active_owner()?;
        let command = GridCommand::from_command_id(keys.command_for(chord)?)?;
        Some((owner, command))
    }
}

/// Keeps one owner's shortcuts bound. Unbinds on drop.
#[derive(Debug)]
pub struct ShortcutGuard {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl ShortcutGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True when this owner is the one handling chords.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.borrow().owners.last() == Some(&self.id))
    }
}

impl Drop for ShortcutGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().owners.retain(|&id| id != self.id);
            log::debug!("unbound document shortcuts for owner {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_owner_handles() {
        let doc = DocumentShortcuts::new();
        let keys = KeybindingManager::default();
        let first = doc.bind();
        let second = doc.bind();
        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(doc.dispatch(&keys, "cmd+c"), Some((second.id(), GridCommand::Copy)));

        drop(second);
        assert!(first.is_active());
        assert_eq!(doc.dispatch(&keys, "ctrl+v"), Some((first.id(), GridCommand::Paste)));
    }

    #[test]
    fn test_drop_unbinds() {
        let doc = DocumentShortcuts::new();
        let keys = KeybindingManager::default();
        {
            let _guard = doc.bind();
            assert_eq!(doc.bound_count(), 1);
        }
        assert_eq!(doc.bound_count(), 0);
        assert_eq!(doc.dispatch(&keys, "ctrl+c"), None);
    }

    #[test]
    fn test_command_ids_round_trip() {
        for command in [GridCommand::Copy, GridCommand::ExportCsv, GridCommand::InheritFromParent] {
            assert_eq!(GridCommand::from_command_id(command.command_id()), Some(command));
        }
        assert_eq!(GridCommand::from_command_id("app.quit"), None);
    }
}
