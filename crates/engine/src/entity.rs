//! Entity model: folders and tasks sharing one grid.
//!
//! Rows are entities. A row is exactly one of [`Entity::Folder`] or
//! [`Entity::Task`]; everything that differs by kind is an exhaustive match
//! on that tag.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::update::EntityUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Folder,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Folder => f.write_str("folder"),
            EntityKind::Task => f.write_str("task"),
        }
    }
}

/// A field value as stored on an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Plain-text rendering used for clipboard and CSV output.
    pub fn to_clipboard_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub folder_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ancestor names, root first.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Effective attribute values (own or inherited).
    #[serde(default)]
    pub attrib: BTreeMap<String, FieldValue>,
    /// Attributes set directly on this folder.
    #[serde(default)]
    pub own_attrib: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub task_type: String,
    #[serde(default)]
    pub status: String,
    pub folder_id: String,
    /// Ancestor names, root first (the parent folder's full path).
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attrib: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub own_attrib: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Folder(Folder),
    Task(Task),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.id,
            Entity::Task(t) => &t.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Folder(_) => EntityKind::Folder,
            Entity::Task(_) => EntityKind::Task,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.name,
            Entity::Task(t) => &t.name,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Entity::Folder(f) => f.label.as_deref(),
            Entity::Task(t) => t.label.as_deref(),
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.status,
            Entity::Task(t) => &t.status,
        }
    }

    /// Folder type or task type.
    pub fn sub_type(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.folder_type,
            Entity::Task(t) => &t.task_type,
        }
    }

    /// Name of the concrete field behind the `subType` column.
    pub fn sub_type_field(&self) -> &'static str {
        match self {
            Entity::Folder(_) => "folderType",
            Entity::Task(_) => "taskType",
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Entity::Folder(f) => &f.tags,
            Entity::Task(t) => &t.tags,
        }
    }

    pub fn parents(&self) -> &[String] {
        match self {
            Entity::Folder(f) => &f.parents,
            Entity::Task(t) => &t.parents,
        }
    }

    /// Hierarchical parent row: a folder's parent folder, a task's folder.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Entity::Folder(f) => f.parent_id.as_deref(),
            Entity::Task(t) => Some(&t.folder_id),
        }
    }

    /// `ancestor/.../name`.
    pub fn full_path(&self) -> String {
        let parents = self.parents();
        if parents.is_empty() {
            return self.name().to_string();
        }
        let mut path = parents.join("/");
        path.push('/');
        path.push_str(self.name());
        path
    }

    pub fn attrib(&self) -> &BTreeMap<String, FieldValue> {
        match self {
            Entity::Folder(f) => &f.attrib,
            Entity::Task(t) => &t.attrib,
        }
    }

    pub fn attrib_value(&self, name: &str) -> FieldValue {
        self.attrib().get(name).cloned().unwrap_or_default()
    }

    /// True when the attribute is set directly on this entity.
    pub fn owns_attrib(&self, name: &str) -> bool {
        match self {
            Entity::Folder(f) => f.own_attrib.contains(name),
            Entity::Task(t) => t.own_attrib.contains(name),
        }
    }

    fn attrib_parts_mut(&mut self) -> (&mut BTreeMap<String, FieldValue>, &mut BTreeSet<String>) {
        match self {
            Entity::Folder(f) => (&mut f.attrib, &mut f.own_attrib),
            Entity::Task(t) => (&mut t.attrib, &mut t.own_attrib),
        }
    }

    /// Apply one direct-field update locally. Returns false when the field
    /// does not exist on this kind or the value has the wrong shape.
    fn set_field(&mut self, field: &str, value: &FieldValue) -> bool {
        match (self, field, value) {
            (Entity::Folder(f), "name", FieldValue::Text(s)) => f.name = s.clone(),
            (Entity::Task(t), "name", FieldValue::Text(s)) => t.name = s.clone(),
            (Entity::Folder(f), "label", v) => f.label = text_or_none(v),
            (Entity::Task(t), "label", v) => t.label = text_or_none(v),
            (Entity::Folder(f), "status", FieldValue::Text(s)) => f.status = s.clone(),
            (Entity::Task(t), "status", FieldValue::Text(s)) => t.status = s.clone(),
            (Entity::Folder(f), "folderType", FieldValue::Text(s)) => f.folder_type = s.clone(),
            (Entity::Task(t), "taskType", FieldValue::Text(s)) => t.task_type = s.clone(),
            (Entity::Folder(f), "tags", v) => f.tags = list_or_empty(v),
            (Entity::Task(t), "tags", v) => t.tags = list_or_empty(v),
            (Entity::Task(t), "assignees", v) => t.assignees = list_or_empty(v),
            _ => return false,
        }
        true
    }
}

fn text_or_none(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        other => Some(other.to_clipboard_text()),
    }
}

fn list_or_empty(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::List(items) => items.clone(),
        FieldValue::Null => Vec::new(),
        other => vec![other.to_clipboard_text()],
    }
}

/// All loaded entities, keyed by row id.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: FxHashMap<String, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut store = Self::new();
        for entity in entities {
            store.insert(entity);
        }
        store
    }

    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id().to_string(), entity)
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Effective value of an attribute after walking up the parent chain
    /// from `id` (exclusive) until an ancestor owns it.
    pub fn inherited_attrib(&self, id: &str, name: &str) -> FieldValue {
        let mut seen = 0;
        let mut current = self.get(id).and_then(Entity::parent_id);
        while let Some(parent_id) = current {
            let Some(parent) = self.get(parent_id) else { break };
            if parent.owns_attrib(name) {
                return parent.attrib_value(name);
            }
            seen += 1;
            if seen > self.entities.len() {
                log::warn!("parent cycle detected above {id}");
                break;
            }
            current = parent.parent_id();
        }
        FieldValue::Null
    }

    /// Apply updates locally and return the untouched originals so a
    /// rejected batch can be rolled back with [`EntityStore::restore`].
    ///
    /// Attribute updates are pushed down to every descendant that inherits
    /// the attribute, and those descendants are part of the originals.
    pub fn apply_updates(&mut self, updates: &[EntityUpdate]) -> Vec<Entity> {
        let mut originals: Vec<Entity> = Vec::new();
        let children = if updates.iter().any(|u| u.is_attrib) {
            self.child_index()
        } else {
            FxHashMap::default()
        };
        for update in updates {
            let inherited = if update.is_attrib && update.value.is_null() {
                self.inherited_attrib(&update.id, &update.field)
            } else {
                FieldValue::Null
            };
            let Some(entity) = self.entities.get_mut(&update.id) else {
                log::debug!("update for unknown entity {}", update.id);
                continue;
            };
            if !originals.iter().any(|e| e.id() == update.id) {
                originals.push(entity.clone());
            }
            if update.is_attrib {
                let (attrib, own) = entity.attrib_parts_mut();
                if update.value.is_null() {
                    own.remove(&update.field);
                    attrib.insert(update.field.clone(), inherited);
                } else {
                    own.insert(update.field.clone());
                    attrib.insert(update.field.clone(), update.value.clone());
                }
                self.propagate_attrib(&update.id, &update.field, &children, &mut originals);
            } else if !entity.set_field(&update.field, &update.value) {
                log::warn!("cannot apply {} to {} {}", update.field, entity.kind(), update.id);
            }
        }
        originals
    }

    /// Parent row id → child row ids.
    fn child_index(&self) -> FxHashMap<String, Vec<String>> {
        let mut index: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for entity in self.entities.values() {
            if let Some(parent) = entity.parent_id() {
                index.entry(parent.to_string()).or_default().push(entity.id().to_string());
            }
        }
        index
    }

    /// Copy the effective value of `name` on `id` down to every descendant
    /// that does not own it. Owners stop the walk.
    fn propagate_attrib(
        &mut self,
        id: &str,
        name: &str,
        children: &FxHashMap<String, Vec<String>>,
        originals: &mut Vec<Entity>,
    ) {
        let Some(root) = self.get(id) else { return };
        let mut stack = vec![(id.to_string(), root.attrib_value(name))];
        let mut visited: FxHashSet<String> = FxHashSet::default();
        visited.insert(id.to_string());
        while let Some((parent, value)) = stack.pop() {
            for child_id in children.get(&parent).into_iter().flatten() {
                if !visited.insert(child_id.clone()) {
                    continue;
                }
                let Some(child) = self.entities.get_mut(child_id) else { continue };
                if child.owns_attrib(name) {
                    continue;
                }
                if !originals.iter().any(|e| e.id() == child_id.as_str()) {
                    originals.push(child.clone());
                }
                let (attrib, _) = child.attrib_parts_mut();
                attrib.insert(name.to_string(), value.clone());
                stack.push((child_id.clone(), value.clone()));
            }
        }
    }

    pub fn restore(&mut self, originals: Vec<Entity>) {
        for entity in originals {
            self.insert(entity);
        }
    }
}
