//! TSV text → coalesced entity updates.
//!
//! Paste runs in two passes. The validation pass checks every target cell
//! and touches nothing; one failure aborts the whole paste. Only then does
//! the build pass coerce values and emit updates.

use taskgrid_core::CellId;

use super::{group_cells, GridView, ParsedClipboardRow};
use crate::entity::Entity;
use crate::error::PasteError;
use crate::fields::{coerce, ColumnDef};
use crate::update::{EntityUpdate, UpdateBatch};
use crate::validation::{validate_cell, ValidationResult, WriteSource};

/// How parsed clipboard values map onto target cells.
///
/// A single value is broadcast to every target. Anything larger is tiled:
/// target row `i` reads parsed row `i % rows`, target column `j` reads value
/// `j % len` of that parsed row.
#[derive(Debug, Clone, Copy)]
pub struct FanOut<'a> {
    rows: &'a [ParsedClipboardRow],
}

impl<'a> FanOut<'a> {
    pub fn new(rows: &'a [ParsedClipboardRow]) -> Result<Self, PasteError> {
        if rows.iter().all(|row| row.values.is_empty()) {
            return Err(PasteError::NothingToPaste);
        }
        Ok(Self { rows })
    }

    pub fn is_broadcast(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].values.len() == 1
    }

    pub fn value(&self, row: usize, col: usize) -> &'a str {
        let rows = self.rows;
        if self.is_broadcast() {
            return &rows[0].values[0];
        }
        let values = &rows[row % rows.len()].values;
        if values.is_empty() {
            return "";
        }
        &values[col % values.len()]
    }
}

/// One target cell that passed validation.
struct AcceptedCell<'v> {
    entity: &'v Entity,
    def: &'v ColumnDef,
    raw: &'v str,
}

/// Validate then build the update batch for pasting `rows` onto `cells`.
pub fn plan_paste<'c, I>(rows: &[ParsedClipboardRow], cells: I, view: &GridView<'_>, full_row: bool) -> Result<UpdateBatch, PasteError>
where
    I: IntoIterator<Item = &'c CellId>,
{
    let fan_out = FanOut::new(rows)?;
    let targets = group_cells(cells, view.grid, full_row);
    if targets.is_empty() {
        return Err(PasteError::NoTarget);
    }

    // Validation pass.
    let mut accepted: Vec<AcceptedCell<'_>> = Vec::new();
    for (i, target) in targets.iter().enumerate() {
        let entity = view
            .entities
            .get(&target.row_id)
            .ok_or_else(|| PasteError::invalid(&target.row_id, "*", "row is not loaded"))?;
        for (j, column) in target.columns.iter().enumerate() {
            let def = view
                .fields
                .get(column)
                .ok_or_else(|| PasteError::invalid(&target.row_id, column, "unknown column"))?;
            let raw = fan_out.value(i, j);
            match validate_cell(view.fields, def, entity, raw, WriteSource::Paste) {
                ValidationResult::Valid => accepted.push(AcceptedCell { entity, def, raw }),
                ValidationResult::Skipped => {}
                ValidationResult::Invalid { message, .. } => {
                    log::debug!("paste rejected at {}/{}: {message}", target.row_id, column);
                    return Err(PasteError::invalid(&target.row_id, column, message));
                }
            }
        }
    }

    // Build pass.
    let mut batch = UpdateBatch::new();
    for cell in accepted {
        let value = coerce(cell.raw, cell.def.value_type(cell.entity))
            .map_err(|message| PasteError::invalid(cell.entity.id(), &cell.def.id, message))?;
        let (field, is_attrib) = cell.def.target.update_field(cell.entity);
        let update = if is_attrib {
            EntityUpdate::attrib(cell.entity.id(), cell.entity.kind(), field, value)
        } else {
            EntityUpdate::direct(cell.entity.id(), cell.entity.kind(), field, value)
        };
        batch.push(update);
    }
    Ok(batch)
}
