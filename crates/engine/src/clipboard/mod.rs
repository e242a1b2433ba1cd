//! Clipboard engine.
//!
//! Copy serializes a selection to TSV text ([`copy`]); paste parses TSV text
//! back into a coalesced batch of entity updates ([`paste`]). Both derive
//! their target cells the same way: group the selected cells by row, then
//! order rows and columns by their position in the current [`GridMap`].

pub mod copy;
pub mod paste;
pub mod tsv;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use taskgrid_core::{CellId, GridMap};

use crate::entity::EntityStore;
use crate::error::ClipboardError;
use crate::fields::FieldRegistry;

pub use copy::serialize_selection;
pub use paste::{plan_paste, FanOut};
pub use tsv::{parse_tsv, write_tsv, ParsedClipboardRow};

/// Everything the clipboard engine reads.
#[derive(Clone, Copy)]
pub struct GridView<'a> {
    pub grid: &'a GridMap,
    pub entities: &'a EntityStore,
    pub fields: &'a FieldRegistry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Emit a header line of raw column ids.
    pub headers: bool,
    /// Rows selected through the row-selection column expand to every
    /// visible column.
    pub full_row: bool,
}

/// Target columns of one selected row, in grid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTargets {
    pub row_id: String,
    pub columns: Vec<String>,
}

/// Group selected cells by row and sort rows and columns by grid index.
/// Ids missing from the grid sort last. Rows left without columns are dropped.
pub fn group_cells<'c, I>(cells: I, grid: &GridMap, full_row: bool) -> Vec<RowTargets>
where
    I: IntoIterator<Item = &'c CellId>,
{
    let mut by_row: BTreeMap<&str, (bool, BTreeSet<&str>)> = BTreeMap::new();
    for cell in cells {
        let entry = by_row.entry(cell.row_id()).or_default();
        if cell.is_row_selection() {
            entry.0 = true;
        } else {
            entry.1.insert(cell.col_id());
        }
    }

    let mut rows: Vec<RowTargets> = by_row
        .into_iter()
        .filter_map(|(row_id, (whole_row, cols))| {
            let mut columns: Vec<String> = if whole_row && full_row {
                grid.col_ids().to_vec()
            } else {
                cols.into_iter().map(str::to_string).collect()
            };
            if columns.is_empty() {
                return None;
            }
            columns.sort_by(|a, b| grid.cmp_cols(a, b));
            Some(RowTargets {
                row_id: row_id.to_string(),
                columns,
            })
        })
        .collect();
    rows.sort_by(|a, b| grid.cmp_rows(&a.row_id, &b.row_id));
    rows
}

/// System clipboard access. Both directions are fallible (permission
/// denied, unsupported content).
#[allow(async_fn_in_trait)]
pub trait ClipboardProvider {
    /// `Ok(None)` when the clipboard holds no text.
    async fn read_text(&self) -> Result<Option<String>, ClipboardError>;
    async fn write_text(&self, text: String) -> Result<(), ClipboardError>;
}

/// In-process clipboard for headless use and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RefCell<Option<String>>,
    denied: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: RefCell::new(Some(text.into())),
            denied: false,
        }
    }

    /// A clipboard that refuses every read and write.
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl ClipboardProvider for MemoryClipboard {
    async fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        if self.denied {
            return Err(ClipboardError::Provider("permission denied".into()));
        }
        Ok(self.text.borrow().clone())
    }

    async fn write_text(&self, text: String) -> Result<(), ClipboardError> {
        if self.denied {
            return Err(ClipboardError::Provider("permission denied".into()));
        }
        *self.text.borrow_mut() = Some(text);
        Ok(())
    }
}
