//! Field accessor registry.
//!
//! Maps every grid column id to a typed accessor over [`Entity`]. Built once
//! from the project schema; the `name` (ancestor path on export) and
//! `subType` (folder or task type) special cases live here as ordinary
//! registry entries.

use rustc_hash::FxHashMap;

use taskgrid_config::schema::{ColumnSchema, ColumnType, ProjectSchema, ATTRIB_PREFIX};

use crate::entity::{Entity, EntityKind, FieldValue};

/// What an accessor reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    Name,
    Label,
    Status,
    SubType,
    Assignees,
    Tags,
    Attrib(String),
}

impl FieldTarget {
    pub fn from_column(column_id: &str) -> Option<Self> {
        let target = match column_id {
            "name" => FieldTarget::Name,
            "label" => FieldTarget::Label,
            "status" => FieldTarget::Status,
            "subType" => FieldTarget::SubType,
            "assignees" => FieldTarget::Assignees,
            "tags" => FieldTarget::Tags,
            other => FieldTarget::Attrib(other.strip_prefix(ATTRIB_PREFIX)?.to_string()),
        };
        Some(target)
    }

    pub fn is_attrib(&self) -> bool {
        matches!(self, FieldTarget::Attrib(_))
    }

    /// Whether entities of `kind` have this field at all.
    pub fn applies_to(&self, kind: EntityKind) -> bool {
        !matches!((self, kind), (FieldTarget::Assignees, EntityKind::Folder))
    }

    /// Current stored value.
    pub fn read(&self, entity: &Entity) -> FieldValue {
        match self {
            FieldTarget::Name => FieldValue::text(entity.name()),
            FieldTarget::Label => entity.label().map(FieldValue::text).unwrap_or_default(),
            FieldTarget::Status => FieldValue::text(entity.status()),
            FieldTarget::SubType => FieldValue::text(entity.sub_type()),
            FieldTarget::Assignees => match entity {
                Entity::Task(t) => FieldValue::List(t.assignees.clone()),
                Entity::Folder(_) => FieldValue::Null,
            },
            FieldTarget::Tags => FieldValue::List(entity.tags().to_vec()),
            FieldTarget::Attrib(name) => entity.attrib_value(name),
        }
    }

    /// Value as it appears in copied / exported text.
    pub fn export_value(&self, entity: &Entity) -> FieldValue {
        match self {
            FieldTarget::Name => FieldValue::text(entity.full_path()),
            other => other.read(entity),
        }
    }

    /// `(field, is_attrib)` an update to this column writes on `entity`.
    pub fn update_field(&self, entity: &Entity) -> (String, bool) {
        match self {
            FieldTarget::Name => ("name".into(), false),
            FieldTarget::Label => ("label".into(), false),
            FieldTarget::Status => ("status".into(), false),
            FieldTarget::SubType => (entity.sub_type_field().into(), false),
            FieldTarget::Assignees => ("assignees".into(), false),
            FieldTarget::Tags => ("tags".into(), false),
            FieldTarget::Attrib(name) => (name.clone(), true),
        }
    }
}

/// One configured column.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub id: String,
    pub target: FieldTarget,
    /// Declared type; `None` means infer from the entity's current value.
    pub declared_type: Option<ColumnType>,
    pub read_only: bool,
    pub enum_values: Vec<String>,
}

impl ColumnDef {
    fn from_schema(schema: &ColumnSchema) -> Option<Self> {
        Some(Self {
            id: schema.id.clone(),
            target: FieldTarget::from_column(&schema.id)?,
            declared_type: schema.value_type,
            read_only: schema.read_only,
            enum_values: schema.enum_values.clone(),
        })
    }

    /// Effective value type for a cell of this column on `entity`.
    ///
    /// `subType` is always an enum; declared types win; otherwise the
    /// entity's current value decides (list, number, bool, else string).
    pub fn value_type(&self, entity: &Entity) -> ColumnType {
        if self.target == FieldTarget::SubType {
            return ColumnType::Enum;
        }
        if let Some(declared) = self.declared_type {
            return declared;
        }
        match self.target.read(entity) {
            FieldValue::List(_) => ColumnType::Array,
            FieldValue::Number(_) => ColumnType::Number,
            FieldValue::Bool(_) => ColumnType::Boolean,
            FieldValue::Null | FieldValue::Text(_) => ColumnType::String,
        }
    }

    pub fn is_enum(&self, entity: &Entity) -> bool {
        matches!(self.value_type(entity), ColumnType::Enum | ColumnType::MultiEnum)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    columns: Vec<ColumnDef>,
    index: FxHashMap<String, usize>,
    folder_types: Vec<String>,
    task_types: Vec<String>,
}

impl FieldRegistry {
    pub fn from_schema(schema: &ProjectSchema) -> Self {
        let mut registry = Self {
            folder_types: schema.folder_types.clone(),
            task_types: schema.task_types.clone(),
            ..Self::default()
        };
        for column in schema.resolved_columns() {
            match ColumnDef::from_schema(&column) {
                Some(def) => {
                    registry.index.insert(def.id.clone(), registry.columns.len());
                    registry.columns.push(def);
                }
                None => log::warn!("skipping column '{}' with no accessor", column.id),
            }
        }
        registry
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnDef> {
        self.index.get(column_id).map(|&i| &self.columns[i])
    }

    /// Column ids in configured order.
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    /// Allowed enum values for a cell, or `None` when unrestricted.
    pub fn allowed_values<'a>(&'a self, def: &'a ColumnDef, kind: EntityKind) -> Option<&'a [String]> {
        let values = match (&def.target, kind) {
            (FieldTarget::SubType, EntityKind::Folder) => &self.folder_types,
            (FieldTarget::SubType, EntityKind::Task) => &self.task_types,
            _ => &def.enum_values,
        };
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }
}

/// Convert pasted text into a typed value.
pub fn coerce(raw: &str, value_type: ColumnType) -> Result<FieldValue, String> {
    match value_type {
        ColumnType::Array | ColumnType::MultiEnum => Ok(FieldValue::List(parse_list(raw))),
        ColumnType::Number => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Null);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| format!("'{trimmed}' is not a number"))
        }
        ColumnType::Boolean => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Null);
            }
            parse_bool(trimmed)
                .map(FieldValue::Bool)
                .ok_or_else(|| format!("'{trimmed}' is not true or false"))
        }
        ColumnType::Enum => Ok(FieldValue::text(raw.trim())),
        ColumnType::String => Ok(FieldValue::text(raw)),
    }
}

/// A JSON array (`["a", "b"]`) or a comma-separated list. Items are trimmed
/// and empty items dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            return items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .filter(|s| !s.trim().is_empty())
                .collect();
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}
