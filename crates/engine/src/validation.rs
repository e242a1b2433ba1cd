//! Pre-commit validation for pasted and edited values.
//!
//! Two layers run before anything reaches the update sink:
//!
//! - **Per-cell rules** ([`validate_cell`]): read-only columns, enum
//!   membership (per-kind allowed sets for `subType`), number and boolean
//!   parsing. Paste runs these over every target cell first and aborts on the
//!   first failure.
//! - **Batch hook** ([`UpdateValidator`]): an external collaborator that sees
//!   the whole proposed batch and may refuse it with a message that is shown
//!   to the user verbatim.
//!
//! ## Case Sensitivity
//!
//! Enum matching is case-sensitive. "Shot" != "shot".

use taskgrid_config::schema::ColumnType;

use crate::entity::Entity;
use crate::fields::{coerce, parse_list, ColumnDef, FieldRegistry, FieldTarget};
use crate::update::EntityUpdate;

/// Where a value is coming from. Paste is stricter about what it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSource {
    Paste,
    Edit,
}

/// Reason why a cell failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailureReason {
    /// Column is configured read-only.
    ReadOnly,
    /// Value not in the column's allowed set.
    NotInList,
    /// Not a finite number.
    InvalidNumber,
    /// Not a recognizable boolean.
    InvalidBoolean,
}

/// Result of validating one cell write.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    /// Cell is left untouched (not an error).
    Skipped,
    Invalid {
        reason: ValidationFailureReason,
        /// Human-readable description of why validation failed.
        message: String,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    fn invalid(reason: ValidationFailureReason, message: String) -> Self {
        ValidationResult::Invalid { reason, message }
    }
}

/// Validate writing `raw` into column `def` of `entity`.
///
/// Skipped (not failed) when pasting into `name`, into a field the entity's
/// kind does not have, or an empty value into an enum column.
pub fn validate_cell(
    fields: &FieldRegistry,
    def: &ColumnDef,
    entity: &Entity,
    raw: &str,
    source: WriteSource,
) -> ValidationResult {
    if source == WriteSource::Paste && def.target == FieldTarget::Name {
        return ValidationResult::Skipped;
    }
    if !def.target.applies_to(entity.kind()) {
        return ValidationResult::Skipped;
    }
    if def.read_only {
        return ValidationResult::invalid(
            ValidationFailureReason::ReadOnly,
            format!("'{}' is read-only", def.id),
        );
    }

    let value_type = def.value_type(entity);
    if def.is_enum(entity) && raw.trim().is_empty() && source == WriteSource::Paste {
        return ValidationResult::Skipped;
    }

    match value_type {
        ColumnType::Enum => match fields.allowed_values(def, entity.kind()) {
            Some(allowed) if !allowed.iter().any(|v| v == raw.trim()) => ValidationResult::invalid(
                ValidationFailureReason::NotInList,
                format!("'{}' is not a valid {} for {} '{}'", raw.trim(), def.id, entity.kind(), entity.name()),
            ),
            _ => ValidationResult::Valid,
        },
        ColumnType::MultiEnum => {
            let Some(allowed) = fields.allowed_values(def, entity.kind()) else {
                return ValidationResult::Valid;
            };
            match parse_list(raw).into_iter().find(|item| !allowed.contains(item)) {
                Some(item) => ValidationResult::invalid(
                    ValidationFailureReason::NotInList,
                    format!("'{item}' is not a valid {}", def.id),
                ),
                None => ValidationResult::Valid,
            }
        }
        ColumnType::Number => match coerce(raw, value_type) {
            Ok(_) => ValidationResult::Valid,
            Err(message) => ValidationResult::invalid(ValidationFailureReason::InvalidNumber, message),
        },
        ColumnType::Boolean => match coerce(raw, value_type) {
            Ok(_) => ValidationResult::Valid,
            Err(message) => ValidationResult::invalid(ValidationFailureReason::InvalidBoolean, message),
        },
        ColumnType::String | ColumnType::Array => ValidationResult::Valid,
    }
}

/// External validation collaborator. Sees the full batch before the sink
/// does; an `Err` refuses the whole batch.
pub trait UpdateValidator {
    fn validate(&self, updates: &[EntityUpdate]) -> Result<(), String>;
}

/// Accepts every batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl UpdateValidator for NoValidation {
    fn validate(&self, _updates: &[EntityUpdate]) -> Result<(), String> {
        Ok(())
    }
}

impl<F> UpdateValidator for F
where
    F: Fn(&[EntityUpdate]) -> Result<(), String>,
{
    fn validate(&self, updates: &[EntityUpdate]) -> Result<(), String> {
        self(updates)
    }
}
