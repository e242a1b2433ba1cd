//! Grid Map - position index for the visible grid
//!
//! Maps row ids and column ids to their integer positions in the currently
//! visible (filtered, sorted, expanded) grid, and back.
//!
//! Key invariants:
//! - Indices are contiguous 0..N-1 for rows and for columns
//! - Both directions are rebuilt together; a map is never patched in place
//! - All lookups are O(1)

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::cell_id::CellId;

/// Bidirectional row/column id <-> index tables.
#[derive(Debug, Clone, Default)]
pub struct GridMap {
    /// index -> row id, in display order
    rows: Vec<String>,
    /// row id -> index
    row_index: FxHashMap<String, usize>,
    /// index -> column id, in display order
    cols: Vec<String>,
    /// column id -> index
    col_index: FxHashMap<String, usize>,
}

impl GridMap {
    /// Build a map from display-ordered row and column ids.
    ///
    /// A repeated id keeps its first position and later repeats are dropped,
    /// so both directions stay bijective.
    pub fn new<R, C>(rows: R, cols: C) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let (rows, row_index) = index_ids(rows);
        let (cols, col_index) = index_ids(cols);
        Self {
            rows,
            row_index,
            cols,
            col_index,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    pub fn row_index(&self, row_id: &str) -> Option<usize> {
        self.row_index.get(row_id).copied()
    }

    pub fn col_index(&self, col_id: &str) -> Option<usize> {
        self.col_index.get(col_id).copied()
    }

    pub fn row_at(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(String::as_str)
    }

    pub fn col_at(&self, index: usize) -> Option<&str> {
        self.cols.get(index).map(String::as_str)
    }

    pub fn contains_row(&self, row_id: &str) -> bool {
        self.row_index.contains_key(row_id)
    }

    pub fn contains_col(&self, col_id: &str) -> bool {
        self.col_index.contains_key(col_id)
    }

    /// True when the cell's row is visible and its column is either visible
    /// or the row-selection pseudo-column.
    pub fn contains_cell(&self, cell: &CellId) -> bool {
        self.contains_row(cell.row_id()) && (cell.is_row_selection() || self.contains_col(cell.col_id()))
    }

    /// Ordered visible row ids.
    pub fn row_ids(&self) -> &[String] {
        &self.rows
    }

    /// Ordered visible column ids.
    pub fn col_ids(&self) -> &[String] {
        &self.cols
    }

    /// Compare two rows by display position. Unknown rows sort last.
    pub fn cmp_rows(&self, a: &str, b: &str) -> Ordering {
        position_key(self.row_index(a)).cmp(&position_key(self.row_index(b)))
    }

    /// Compare two columns by display position. Unknown columns sort last.
    pub fn cmp_cols(&self, a: &str, b: &str) -> Ordering {
        position_key(self.col_index(a)).cmp(&position_key(self.col_index(b)))
    }
}

fn position_key(index: Option<usize>) -> usize {
    index.unwrap_or(usize::MAX)
}

fn index_ids<I>(ids: I) -> (Vec<String>, FxHashMap<String, usize>)
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut ordered = Vec::new();
    let mut index = FxHashMap::default();
    for id in ids {
        let id = id.into();
        if index.contains_key(&id) {
            continue;
        }
        index.insert(id.clone(), ordered.len());
        ordered.push(id);
    }
    (ordered, index)
}
