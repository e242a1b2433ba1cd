//! Cell editing state machine.
//!
//! One state variable, the editing cell. `Idle` is `None`. Moving the editor
//! to another cell always passes through `Idle`: the previous editor is
//! closed first and reported in [`EditTransition::closed`] so the caller can
//! run its commit-or-cancel policy on it.

use taskgrid_core::cell_id::is_placeholder_row;
use taskgrid_core::CellId;

use crate::clipboard::GridView;
use crate::entity::{Entity, FieldValue};
use crate::error::EditError;
use crate::fields::{coerce, ColumnDef, FieldTarget};
use crate::update::{EntityUpdate, UpdateBatch};
use crate::validation::{validate_cell, ValidationFailureReason, ValidationResult, WriteSource};

/// Key or event that ended an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// Focus left the editor.
    Blur,
    Enter,
    /// Commit and move on (Tab / Enter-and-advance). Persists even an
    /// unchanged value so keyboard fill works.
    SubmitAndAdvance,
}

impl CommitTrigger {
    pub fn forces_write(self) -> bool {
        matches!(self, CommitTrigger::SubmitAndAdvance)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditTransition {
    /// Editor that was closed by this transition.
    pub closed: Option<CellId>,
    /// Editor that is now open.
    pub opened: Option<CellId>,
}

#[derive(Debug, Clone, Default)]
pub struct EditingStore {
    editing: Option<CellId>,
}

impl EditingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing(&self) -> Option<&CellId> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self, cell: &CellId) -> bool {
        self.editing.as_ref() == Some(cell)
    }

    /// `Idle -> Editing(cell)`. An open editor on another cell is closed
    /// first. Placeholder rows and the row-selection column never open.
    pub fn begin_edit(&mut self, cell: &CellId) -> Result<EditTransition, EditError> {
        if is_placeholder_row(cell.row_id()) || cell.is_row_selection() {
            return Err(EditError::NotEditable(cell.row_id().to_string()));
        }
        if self.is_editing(cell) {
            return Ok(EditTransition::default());
        }
        let closed = self.finish();
        log::debug!("editing {cell}");
        self.editing = Some(cell.clone());
        Ok(EditTransition {
            closed,
            opened: Some(cell.clone()),
        })
    }

    /// A plain click somewhere in the grid. Clicking anywhere but the
    /// editing cell closes the editor; the click itself is handled separately.
    pub fn click(&mut self, cell: &CellId) -> Option<CellId> {
        if self.is_editing(cell) {
            return None;
        }
        self.finish()
    }

    /// `Editing -> Idle` (commit or cancel). Returns the closed cell.
    pub fn finish(&mut self) -> Option<CellId> {
        let closed = self.editing.take();
        if let Some(cell) = &closed {
            log::debug!("closed editor on {cell}");
        }
        closed
    }
}

/// Where a displayed value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Set on the entity itself.
    Own,
    /// Derived from an ancestor; rendered in the inherited style.
    Inherited,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellDisplay {
    pub value: FieldValue,
    pub source: ValueSource,
}

/// Value and provenance of one cell, for rendering.
pub fn cell_display(view: &GridView<'_>, cell: &CellId) -> Option<CellDisplay> {
    let entity = view.entities.get(cell.row_id())?;
    let def = view.fields.get(cell.col_id())?;
    let value = def.target.read(entity);
    let source = match &def.target {
        FieldTarget::Attrib(name) if entity.owns_attrib(name) => ValueSource::Own,
        FieldTarget::Attrib(_) if !value.is_null() => ValueSource::Inherited,
        _ if is_blank(&value) => ValueSource::Empty,
        _ => ValueSource::Own,
    };
    Some(CellDisplay { value, source })
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Text(s) => s.is_empty(),
        FieldValue::List(items) => items.is_empty(),
        FieldValue::Bool(_) | FieldValue::Number(_) => false,
    }
}

fn resolve<'v>(view: &GridView<'v>, cell: &CellId) -> Result<(&'v Entity, &'v ColumnDef), EditError> {
    let entity = view
        .entities
        .get(cell.row_id())
        .ok_or_else(|| EditError::MissingEntity(cell.row_id().to_string()))?;
    let def = view
        .fields
        .get(cell.col_id())
        .ok_or_else(|| EditError::UnknownColumn(cell.col_id().to_string()))?;
    Ok((entity, def))
}

/// Typed update for writing `raw` into one cell, or `None` when the write
/// is a no-op (unchanged value without a forcing trigger, or a field this
/// entity kind does not have).
fn cell_update(
    view: &GridView<'_>,
    cell: &CellId,
    raw: &str,
    trigger: CommitTrigger,
) -> Result<Option<EntityUpdate>, EditError> {
    let (entity, def) = resolve(view, cell)?;
    match validate_cell(view.fields, def, entity, raw, WriteSource::Edit) {
        ValidationResult::Valid => {}
        ValidationResult::Skipped => return Ok(None),
        ValidationResult::Invalid {
            reason: ValidationFailureReason::ReadOnly,
            ..
        } => return Err(EditError::ReadOnly(def.id.clone())),
        ValidationResult::Invalid { message, .. } => return Err(EditError::Invalid(message)),
    }

    let value = coerce(raw, def.value_type(entity)).map_err(EditError::Invalid)?;
    if value == def.target.read(entity) && !trigger.forces_write() {
        return Ok(None);
    }
    let (field, is_attrib) = def.target.update_field(entity);
    Ok(Some(if is_attrib {
        EntityUpdate::attrib(entity.id(), entity.kind(), field, value)
    } else {
        EntityUpdate::direct(entity.id(), entity.kind(), field, value)
    }))
}

/// Build the batch for committing `raw` into `cell`.
///
/// `also` lists other selected cells; those in the same column receive the
/// same value (bulk edit). Every cell is validated before anything is
/// returned; one failure rejects the whole batch.
pub fn plan_commit(
    view: &GridView<'_>,
    cell: &CellId,
    raw: &str,
    trigger: CommitTrigger,
    also: &[CellId],
) -> Result<UpdateBatch, EditError> {
    let bulk = also
        .iter()
        .filter(|other| *other != cell && other.col_id() == cell.col_id());
    let mut batch = UpdateBatch::new();
    for target in std::iter::once(cell).chain(bulk) {
        if let Some(update) = cell_update(view, target, raw, trigger)? {
            batch.push(update);
        }
    }
    Ok(batch)
}

/// Clear the entity's own value for an attribute so the parent's value
/// shows through. Empty when the value is already inherited.
pub fn plan_inherit(view: &GridView<'_>, cell: &CellId) -> Result<UpdateBatch, EditError> {
    let (entity, def) = resolve(view, cell)?;
    let FieldTarget::Attrib(name) = &def.target else {
        return Err(EditError::NotInheritable(def.id.clone()));
    };
    if def.read_only {
        return Err(EditError::ReadOnly(def.id.clone()));
    }
    if entity.parent_id().is_none() {
        return Err(EditError::NotInheritable(def.id.clone()));
    }
    let mut batch = UpdateBatch::new();
    if entity.owns_attrib(name) {
        batch.push(EntityUpdate::attrib(entity.id(), entity.kind(), name.clone(), FieldValue::Null));
    }
    Ok(batch)
}
