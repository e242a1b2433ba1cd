//! Project column schema.
//!
//! Describes which columns the grid shows, the value type of each and the
//! enum vocabularies (statuses, folder types, task types). Read from TOML:
//!
//! ```toml
//! statuses = ["not_started", "in_progress", "approved"]
//! folder_types = ["Episode", "Sequence", "Shot"]
//! task_types = ["Animation", "Compositing"]
//!
//! [[columns]]
//! id = "attrib_fps"
//! type = "number"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Prefix marking a column as an attribute field.
pub const ATTRIB_PREFIX: &str = "attrib_";

/// Built-in direct columns every project has.
pub const BUILTIN_COLUMNS: &[&str] = &["name", "label", "status", "subType", "assignees", "tags"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Enum,
    MultiEnum,
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub id: String,
    /// Declared value type. When absent the type is inferred from entity data.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ColumnType>,
    #[serde(default)]
    pub read_only: bool,
    /// Allowed values for enum columns.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl ColumnSchema {
    pub fn new(id: impl Into<String>, value_type: Option<ColumnType>) -> Self {
        Self {
            id: id.into(),
            value_type,
            read_only: false,
            enum_values: Vec::new(),
        }
    }

    pub fn is_attrib(&self) -> bool {
        self.id.starts_with(ATTRIB_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSchema {
    pub statuses: Vec<String>,
    pub folder_types: Vec<String>,
    pub task_types: Vec<String>,
    /// Extra columns; built-in columns may be listed to override them.
    pub columns: Vec<ColumnSchema>,
}

impl ProjectSchema {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let schema: Self = toml::from_str(text)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    fn check(&self) -> Result<(), ConfigError> {
        for (i, column) in self.columns.iter().enumerate() {
            if column.id.is_empty() {
                return Err(ConfigError::Schema(format!("column #{} has an empty id", i + 1)));
            }
            if !column.is_attrib() && !BUILTIN_COLUMNS.contains(&column.id.as_str()) {
                return Err(ConfigError::Schema(format!(
                    "unknown column '{}' (attribute columns start with '{ATTRIB_PREFIX}')",
                    column.id
                )));
            }
            if self.columns[..i].iter().any(|c| c.id == column.id) {
                return Err(ConfigError::Schema(format!("column '{}' is listed twice", column.id)));
            }
        }
        Ok(())
    }

    /// Built-in columns followed by configured attribute columns. A
    /// configured entry for a built-in column is layered over its defaults:
    /// only the keys it sets replace them.
    pub fn resolved_columns(&self) -> Vec<ColumnSchema> {
        let mut resolved: Vec<ColumnSchema> = BUILTIN_COLUMNS
            .iter()
            .map(|id| {
                let builtin = self.builtin_column(id);
                match self.columns.iter().find(|c| c.id == *id) {
                    Some(configured) => ColumnSchema {
                        id: builtin.id,
                        value_type: configured.value_type.or(builtin.value_type),
                        read_only: configured.read_only,
                        enum_values: if configured.enum_values.is_empty() {
                            builtin.enum_values
                        } else {
                            configured.enum_values.clone()
                        },
                    },
                    None => builtin,
                }
            })
            .collect();
        resolved.extend(self.columns.iter().filter(|c| c.is_attrib()).cloned());
        resolved
    }

    fn builtin_column(&self, id: &str) -> ColumnSchema {
        match id {
            "status" => ColumnSchema {
                enum_values: self.statuses.clone(),
                ..ColumnSchema::new(id, Some(ColumnType::Enum))
            },
            // Allowed values depend on the row kind; see folder_types/task_types.
            "subType" => ColumnSchema::new(id, Some(ColumnType::Enum)),
            "assignees" | "tags" => ColumnSchema::new(id, Some(ColumnType::Array)),
            _ => ColumnSchema::new(id, Some(ColumnType::String)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
statuses = ["not_started", "in_progress", "approved"]
folder_types = ["Episode", "Sequence", "Shot"]
task_types = ["Animation", "Compositing"]

[[columns]]
id = "attrib_fps"
type = "number"

[[columns]]
id = "attrib_priority"
type = "enum"
enum = ["low", "high"]

[[columns]]
id = "label"
read_only = true
"#;

    #[test]
    fn test_parse_and_resolve() {
        let schema = ProjectSchema::from_toml_str(SAMPLE).unwrap();
        let columns = schema.resolved_columns();
        let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["name", "label", "status", "subType", "assignees", "tags", "attrib_fps", "attrib_priority"]
        );

        let status = &columns[2];
        assert_eq!(status.value_type, Some(ColumnType::Enum));
        assert_eq!(status.enum_values.len(), 3);

        let label = &columns[1];
        assert!(label.read_only);
        assert_eq!(label.value_type, Some(ColumnType::String));

        assert_eq!(columns[6].value_type, Some(ColumnType::Number));
    }

    #[test]
    fn test_rejects_unknown_direct_column() {
        let err = ProjectSchema::from_toml_str("[[columns]]\nid = \"frames\"\n").unwrap_err();
        assert!(err.to_string().contains("frames"));
    }

    #[test]
    fn test_rejects_duplicate_column() {
        let text = "[[columns]]\nid = \"attrib_fps\"\n[[columns]]\nid = \"attrib_fps\"\n";
        assert!(matches!(ProjectSchema::from_toml_str(text), Err(ConfigError::Schema(_))));
    }

    #[test]
    fn test_empty_schema_has_builtins() {
        let schema = ProjectSchema::default();
        assert_eq!(schema.resolved_columns().len(), BUILTIN_COLUMNS.len());
    }

    #[test]
    fn test_builtin_override_keeps_defaults() {
        let text = r#"
statuses = ["not_started", "approved"]

[[columns]]
id = "status"
read_only = true

[[columns]]
id = "tags"
type = "enum"
enum = ["hero", "bg"]
"#;
        let columns = ProjectSchema::from_toml_str(text).unwrap().resolved_columns();

        let status = columns.iter().find(|c| c.id == "status").unwrap();
        assert!(status.read_only);
        assert_eq!(status.value_type, Some(ColumnType::Enum));
        assert_eq!(status.enum_values, vec!["not_started", "approved"]);

        let tags = columns.iter().find(|c| c.id == "tags").unwrap();
        assert!(!tags.read_only);
        assert_eq!(tags.value_type, Some(ColumnType::Enum));
        assert_eq!(tags.enum_values, vec!["hero", "bg"]);
    }
}
