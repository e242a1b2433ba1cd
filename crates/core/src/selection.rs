//! Selection model for the entity grid.
//!
//! The selection is a set of [`CellId`]s plus a focused cell and the anchor
//! used by shift-extension. All range math goes through the current
//! [`GridMap`], so ids that fell out of the visible grid (virtualization,
//! filtering, collapse) silently degrade to no-ops instead of panicking.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cell_id::{is_placeholder_row, CellId};
use crate::grid_map::GridMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Plain click on the only selected cell (or row) clears the selection.
    pub click_to_deselect: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            click_to_deselect: true,
        }
    }
}

/// Snapshot of what is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected: BTreeSet<CellId>,
    pub focused: Option<CellId>,
    /// Anchor for shift-extension.
    pub last_selected: Option<CellId>,
}

/// Owns the selection and implements click / shift-click / ctrl-click.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    state: SelectionState,
    options: SelectionOptions,
    disabled_rows: FxHashSet<String>,
}

impl SelectionStore {
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn options(&self) -> SelectionOptions {
        self.options
    }

    pub fn selected(&self) -> &BTreeSet<CellId> {
        &self.state.selected
    }

    pub fn focused(&self) -> Option<&CellId> {
        self.state.focused.as_ref()
    }

    pub fn last_selected(&self) -> Option<&CellId> {
        self.state.last_selected.as_ref()
    }

    pub fn is_selected(&self, cell: &CellId) -> bool {
        self.state.selected.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.state.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.selected.is_empty()
    }

    /// Replace the set of rows that can never be selected.
    pub fn set_disabled_rows<I>(&mut self, rows: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.disabled_rows = rows.into_iter().map(Into::into).collect();
        let disabled = &self.disabled_rows;
        self.state.selected.retain(|cell| !disabled.contains(cell.row_id()));
    }

    pub fn is_row_selectable(&self, row_id: &str) -> bool {
        !is_placeholder_row(row_id) && !self.disabled_rows.contains(row_id)
    }

    /// Click handling.
    ///
    /// - plain: replace the selection with `cell` (or clear it, when `cell` is
    ///   already the whole selection and click-to-deselect is on)
    /// - `toggle` (ctrl/cmd): flip `cell` in or out of the set
    /// - `extend` (shift): select the rectangle between the anchor and `cell`;
    ///   with `toggle` as well, the rectangle is added to the existing set
    ///
    /// A row-selection pseudo-cell stands for its whole row.
    pub fn select_cell(&mut self, cell: &CellId, grid: &GridMap, extend: bool, toggle: bool) {
        if !self.is_row_selectable(cell.row_id()) {
            log::debug!("ignoring click on non-selectable row {}", cell.row_id());
            return;
        }
        if !grid.contains_cell(cell) {
            log::debug!("ignoring click on cell {cell} outside the visible grid");
            return;
        }

        if extend {
            let anchor = self
                .state
                .last_selected
                .clone()
                .filter(|anchor| grid.contains_cell(anchor));
            if let Some(anchor) = anchor {
                let range = self.range_cells(&anchor, cell, grid);
                if range.is_empty() {
                    return;
                }
                if !toggle {
                    self.state.selected.clear();
                }
                self.state.selected.extend(range);
                self.state.focused = Some(cell.clone());
                return;
            }
            // No usable anchor: behave like a plain click.
            self.replace_with(cell, grid);
            return;
        }

        let unit = self.unit_cells(cell, grid);
        if toggle {
            if self.state.selected.contains(cell) {
                for c in &unit {
                    self.state.selected.remove(c);
                }
            } else {
                self.state.selected.extend(unit);
            }
            self.state.focused = Some(cell.clone());
            self.state.last_selected = Some(cell.clone());
            return;
        }

        let already_only = self.state.selected.len() == unit.len()
            && unit.iter().all(|c| self.state.selected.contains(c));
        if self.options.click_to_deselect && already_only {
            self.clear();
            return;
        }
        self.replace_with(cell, grid);
    }

    /// Select a whole row through its row-selection pseudo-cell.
    pub fn select_row(&mut self, row_id: &str, grid: &GridMap, extend: bool, toggle: bool) {
        self.select_cell(&CellId::row_selection(row_id), grid, extend, toggle);
    }

    /// Select every selectable cell of the grid. Focus and anchor are kept.
    pub fn select_all(&mut self, grid: &GridMap) {
        self.state.selected = grid
            .row_ids()
            .iter()
            .filter(|row| self.is_row_selectable(row))
            .flat_map(|row| grid.col_ids().iter().map(move |col| CellId::new(row.as_str(), col.as_str())))
            .collect();
    }

    pub fn clear(&mut self) {
        self.state.selected.clear();
        self.state.focused = None;
        self.state.last_selected = None;
    }

    /// Arrow-key navigation from the focused cell, clamped to the grid.
    /// With `extend` the anchor stays put and the rectangle grows. A focused
    /// row-selection cell starts from the first column of its row.
    pub fn move_focus(&mut self, d_row: isize, d_col: isize, grid: &GridMap, extend: bool) {
        if grid.is_empty() {
            return;
        }
        let (row, col) = self
            .state
            .focused
            .as_ref()
            .and_then(|f| {
                let col = if f.is_row_selection() { 0 } else { grid.col_index(f.col_id())? };
                Some((grid.row_index(f.row_id())?, col))
            })
            .unwrap_or((0, 0));

        let new_row = clamp_step(row, d_row, grid.row_count());
        let new_col = clamp_step(col, d_col, grid.col_count());
        let (Some(row_id), Some(col_id)) = (grid.row_at(new_row), grid.col_at(new_col)) else {
            return;
        };
        let target = CellId::new(row_id, col_id);
        if !self.is_row_selectable(target.row_id()) {
            return;
        }
        if extend {
            self.select_cell(&target, grid, true, false);
        } else {
            self.replace_with(&target, grid);
        }
    }

    /// Drop every id that no longer exists in `grid`. Called after each
    /// grid map rebuild; placeholder rows are always dropped.
    pub fn prune(&mut self, grid: &GridMap) {
        let before = self.state.selected.len();
        let disabled = &self.disabled_rows;
        let keep = |cell: &CellId| {
            grid.contains_cell(cell) && !is_placeholder_row(cell.row_id()) && !disabled.contains(cell.row_id())
        };
        self.state.selected.retain(|cell| keep(cell));
        if self.state.focused.as_ref().is_some_and(|c| !keep(c)) {
            self.state.focused = None;
        }
        if self.state.last_selected.as_ref().is_some_and(|c| !keep(c)) {
            self.state.last_selected = None;
        }
        let dropped = before - self.state.selected.len();
        if dropped > 0 {
            log::debug!("pruned {dropped} stale selected cells");
        }
    }

    /// Distinct selected rows, in grid order.
    pub fn selected_rows(&self, grid: &GridMap) -> Vec<String> {
        let mut rows: Vec<String> = self
            .state
            .selected
            .iter()
            .map(|c| c.row_id().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        rows.sort_by(|a, b| grid.cmp_rows(a, b));
        rows
    }

    /// Row ids between `a` and `b` (inclusive) in the current grid order.
    /// Empty when either row is not visible.
    pub fn row_range(a: &str, b: &str, grid: &GridMap) -> Vec<String> {
        let (Some(ia), Some(ib)) = (grid.row_index(a), grid.row_index(b)) else {
            return Vec::new();
        };
        let (lo, hi) = (ia.min(ib), ia.max(ib));
        grid.row_ids()[lo..=hi].to_vec()
    }

    fn replace_with(&mut self, cell: &CellId, grid: &GridMap) {
        self.state.selected = self.unit_cells(cell, grid).into_iter().collect();
        self.state.focused = Some(cell.clone());
        self.state.last_selected = Some(cell.clone());
    }

    /// A plain cell is its own unit; a row-selection cell is the whole row.
    fn unit_cells(&self, cell: &CellId, grid: &GridMap) -> Vec<CellId> {
        if cell.is_row_selection() {
            row_cells(cell.row_id(), grid)
        } else {
            vec![cell.clone()]
        }
    }

    fn range_cells(&self, anchor: &CellId, target: &CellId, grid: &GridMap) -> Vec<CellId> {
        let rows = Self::row_range(anchor.row_id(), target.row_id(), grid);
        let rows = rows.iter().filter(|r| self.is_row_selectable(r));

        if anchor.is_row_selection() || target.is_row_selection() {
            return rows.flat_map(|r| row_cells(r, grid)).collect();
        }

        let (Some(ca), Some(cb)) = (grid.col_index(anchor.col_id()), grid.col_index(target.col_id())) else {
            return Vec::new();
        };
        let cols = &grid.col_ids()[ca.min(cb)..=ca.max(cb)];
        rows.flat_map(|r| cols.iter().map(move |c| CellId::new(r.as_str(), c.as_str())))
            .collect()
    }
}

fn row_cells(row_id: &str, grid: &GridMap) -> Vec<CellId> {
    std::iter::once(CellId::row_selection(row_id))
        .chain(grid.col_ids().iter().map(|col| CellId::new(row_id, col.as_str())))
        .collect()
}

fn clamp_step(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).clamp(0, len as isize - 1) as usize
}
