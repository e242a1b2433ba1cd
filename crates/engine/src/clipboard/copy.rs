//! Selection → TSV text.

use taskgrid_core::CellId;

use super::{group_cells, write_tsv, CopyOptions, GridView};
use crate::error::ClipboardError;

/// Serialize the selected cells.
///
/// The header line (when requested) is the union of every row's columns in
/// grid order; data lines carry only the columns selected on that row. Any
/// extraction failure aborts the whole export, no partial text is returned.
pub fn serialize_selection<'c, I>(cells: I, view: &GridView<'_>, options: CopyOptions) -> Result<String, ClipboardError>
where
    I: IntoIterator<Item = &'c CellId>,
{
    let targets = group_cells(cells, view.grid, options.full_row);
    if targets.is_empty() {
        return Err(ClipboardError::NothingSelected);
    }

    let mut lines: Vec<Vec<String>> = Vec::with_capacity(targets.len() + 1);
    if options.headers {
        let mut header: Vec<String> = Vec::new();
        for column in targets.iter().flat_map(|row| row.columns.iter()) {
            if !header.contains(column) {
                header.push(column.clone());
            }
        }
        header.sort_by(|a, b| view.grid.cmp_cols(a, b));
        lines.push(header);
    }

    for row in &targets {
        let entity = view
            .entities
            .get(&row.row_id)
            .ok_or_else(|| ClipboardError::MissingEntity(row.row_id.clone()))?;
        let values = row
            .columns
            .iter()
            .map(|column| {
                let def = view
                    .fields
                    .get(column)
                    .ok_or_else(|| ClipboardError::UnknownColumn(column.clone()))?;
                Ok(def.target.export_value(entity).to_clipboard_text())
            })
            .collect::<Result<Vec<_>, ClipboardError>>()?;
        lines.push(values);
    }

    let text = write_tsv(&lines)?;
    log::debug!("copied {} rows", targets.len());
    Ok(text)
}
