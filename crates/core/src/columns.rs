//! Column layout and row pinning as pure reducers.
//!
//! Each reducer takes the previous state and one event and returns the next
//! state. [`apply_column_event`] runs them in a fixed order:
//! visibility, then pinning, then order.

use serde::{Deserialize, Serialize};

/// Which columns exist, which are hidden and which are pinned to the left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnState {
    /// All known columns in their configured order.
    pub order: Vec<String>,
    pub hidden: Vec<String>,
    /// Pinned columns, in pin order.
    pub pinned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnEvent {
    SetHidden { column: String, hidden: bool },
    Pin(String),
    Unpin(String),
    /// Replace the known columns (schema reload). Unknown pins/hides are dropped.
    SetColumns(Vec<String>),
}

impl ColumnState {
    pub fn new<I>(columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            order: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden.iter().any(|c| c == column)
    }

    pub fn is_pinned(&self, column: &str) -> bool {
        self.pinned.iter().any(|c| c == column)
    }

    /// Visible columns in display order: pinned first, then the rest.
    pub fn visible_columns(&self) -> Vec<String> {
        let pinned = self.pinned.iter().filter(|c| !self.is_hidden(c));
        let rest = self
            .order
            .iter()
            .filter(|c| !self.is_pinned(c) && !self.is_hidden(c));
        pinned.chain(rest).cloned().collect()
    }
}

/// Run one event through the reducer pipeline.
pub fn apply_column_event(state: ColumnState, event: &ColumnEvent) -> ColumnState {
    let state = reduce_visibility(state, event);
    let state = reduce_pinning(state, event);
    reduce_order(state, event)
}

pub fn reduce_visibility(mut state: ColumnState, event: &ColumnEvent) -> ColumnState {
    match event {
        ColumnEvent::SetHidden { column, hidden: true } => {
            if !state.is_hidden(column) {
                state.hidden.push(column.clone());
            }
        }
        ColumnEvent::SetHidden { column, hidden: false } => {
            state.hidden.retain(|c| c != column);
        }
        ColumnEvent::SetColumns(columns) => {
            state.hidden.retain(|c| columns.contains(c));
        }
        ColumnEvent::Pin(_) | ColumnEvent::Unpin(_) => {}
    }
    state
}

/// Pins follow visibility: a hidden column is never pinned.
pub fn reduce_pinning(mut state: ColumnState, event: &ColumnEvent) -> ColumnState {
    match event {
        ColumnEvent::Pin(column) => {
            if !state.is_pinned(column) && !state.is_hidden(column) {
                state.pinned.push(column.clone());
            }
        }
        ColumnEvent::Unpin(column) => state.pinned.retain(|c| c != column),
        ColumnEvent::SetHidden { .. } | ColumnEvent::SetColumns(_) => {}
    }
    let hidden = state.hidden.clone();
    state.pinned.retain(|c| !hidden.contains(c));
    state
}

/// Order follows pinning: pinned columns move to the front in pin order.
pub fn reduce_order(mut state: ColumnState, event: &ColumnEvent) -> ColumnState {
    if let ColumnEvent::SetColumns(columns) = event {
        state.order = columns.clone();
        let order = state.order.clone();
        state.pinned.retain(|c| order.contains(c));
    }
    let (mut front, back): (Vec<String>, Vec<String>) =
        state.order.into_iter().partition(|c| state.pinned.contains(c));
    front.sort_by_key(|c| state.pinned.iter().position(|p| p == c));
    front.extend(back);
    state.order = front;
    state
}

/// Rows pinned above the tree, in pin order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPins {
    pub rows: Vec<String>,
}

impl RowPins {
    pub fn contains(&self, row_id: &str) -> bool {
        self.rows.iter().any(|r| r == row_id)
    }
}

pub fn pin_rows<I>(mut pins: RowPins, rows: I) -> RowPins
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    for row in rows {
        let row = row.into();
        if !pins.contains(&row) {
            pins.rows.push(row);
        }
    }
    pins
}

pub fn unpin_rows<'a, I>(mut pins: RowPins, rows: I) -> RowPins
where
    I: IntoIterator<Item = &'a str>,
{
    let remove: Vec<&str> = rows.into_iter().collect();
    pins.rows.retain(|r| !remove.contains(&r.as_str()));
    pins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ColumnState {
        ColumnState::new(["name", "status", "subType", "attrib_fps"])
    }

    #[test]
    fn test_visible_columns_pinned_first() {
        let s = apply_column_event(state(), &ColumnEvent::Pin("attrib_fps".into()));
        assert_eq!(s.visible_columns(), vec!["attrib_fps", "name", "status", "subType"]);
        assert_eq!(s.order[0], "attrib_fps");
    }

    #[test]
    fn test_hiding_unpins() {
        let s = apply_column_event(state(), &ColumnEvent::Pin("status".into()));
        let s = apply_column_event(
            s,
            &ColumnEvent::SetHidden {
                column: "status".into(),
                hidden: true,
            },
        );
        assert!(!s.is_pinned("status"));
        assert_eq!(s.visible_columns(), vec!["name", "subType", "attrib_fps"]);

        // A hidden column cannot be pinned
        let s = apply_column_event(s, &ColumnEvent::Pin("status".into()));
        assert!(s.pinned.is_empty());
    }

    #[test]
    fn test_set_columns_drops_unknown() {
        let s = apply_column_event(state(), &ColumnEvent::Pin("attrib_fps".into()));
        let s = apply_column_event(
            s,
            &ColumnEvent::SetHidden {
                column: "subType".into(),
                hidden: true,
            },
        );
        let s = apply_column_event(s, &ColumnEvent::SetColumns(vec!["name".into(), "status".into()]));
        assert!(s.pinned.is_empty());
        assert!(s.hidden.is_empty());
        assert_eq!(s.visible_columns(), vec!["name", "status"]);
    }

    #[test]
    fn test_row_pins() {
        let pins = pin_rows(RowPins::default(), ["t2", "t1", "t2"]);
        assert_eq!(pins.rows, vec!["t2", "t1"]);
        let pins = unpin_rows(pins, ["t2"]);
        assert_eq!(pins.rows, vec!["t1"]);
    }
}
