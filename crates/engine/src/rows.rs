//! Row tree flattening and viewport windowing.
//!
//! The hierarchy (folders containing folders and tasks) is flattened into a
//! list of display rows according to the expansion state, with pinned rows
//! lifted to the top and loading placeholders appended at the bottom. Only
//! the slice of that list intersecting the viewport is rendered.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use taskgrid_core::cell_id::PLACEHOLDER_ROW_PREFIX;
use taskgrid_core::columns::RowPins;

use crate::entity::{Entity, EntityKind, EntityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Folder,
    Task,
    /// Synthetic loading row. Never selectable or editable.
    Placeholder,
}

impl From<EntityKind> for RowKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Folder => RowKind::Folder,
            EntityKind::Task => RowKind::Task,
        }
    }
}

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub id: String,
    pub kind: RowKind,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub pinned: bool,
}

/// Synthetic id of the `n`th placeholder row.
pub fn placeholder_id(n: usize) -> String {
    format!("{PLACEHOLDER_ROW_PREFIX}{n}")
}

/// Which rows are expanded. Rows not listed are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeMap<String, bool>,
}

impl ExpansionState {
    pub fn from_map(expanded: BTreeMap<String, bool>) -> Self {
        Self { expanded }
    }

    pub fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.expanded
    }

    pub fn is_expanded(&self, row_id: &str) -> bool {
        self.expanded.get(row_id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, row_id: &str, expanded: bool) {
        if expanded {
            self.expanded.insert(row_id.to_string(), true);
        } else {
            self.expanded.remove(row_id);
        }
    }

    /// Flip one row. Returns the new state.
    pub fn toggle(&mut self, row_id: &str) -> bool {
        let next = !self.is_expanded(row_id);
        self.set(row_id, next);
        next
    }
}

/// Parent/child structure of the loaded entities.
#[derive(Debug, Clone, Default)]
pub struct RowTree {
    roots: Vec<String>,
    children: FxHashMap<String, Vec<String>>,
    kinds: FxHashMap<String, EntityKind>,
}

impl RowTree {
    /// Folders hang under their parent folder, tasks under their folder.
    /// Rows whose parent is not loaded become roots. Siblings list folders
    /// before tasks, each sorted by name.
    pub fn build(entities: &EntityStore) -> Self {
        let mut tree = Self::default();
        let mut sorted: Vec<&Entity> = entities.iter().collect();
        sorted.sort_by(|a, b| {
            a.kind()
                .cmp(&b.kind())
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.id().cmp(b.id()))
        });
        for entity in sorted {
            tree.kinds.insert(entity.id().to_string(), entity.kind());
            match entity.parent_id().filter(|p| entities.get(p).is_some()) {
                Some(parent) => tree
                    .children
                    .entry(parent.to_string())
                    .or_default()
                    .push(entity.id().to_string()),
                None => tree.roots.push(entity.id().to_string()),
            }
        }
        tree
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children(&self, row_id: &str) -> &[String] {
        self.children.get(row_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, row_id: &str) -> bool {
        self.kinds.contains_key(row_id)
    }

    /// Display rows: pinned rows (with their expanded subtrees) first, then
    /// the rest of the tree, then `placeholders` loading rows.
    pub fn flatten(&self, expansion: &ExpansionState, pins: &RowPins, placeholders: usize) -> Vec<FlatRow> {
        let mut out = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let pinned: Vec<&String> = pins.rows.iter().filter(|id| self.contains(id)).collect();
        let skip: FxHashSet<&str> = pinned.iter().map(|id| id.as_str()).collect();

        for id in &pinned {
            self.walk(id, 0, true, expansion, &FxHashSet::default(), &mut seen, &mut out);
        }
        for id in &self.roots {
            self.walk(id, 0, false, expansion, &skip, &mut seen, &mut out);
        }
        out.extend((0..placeholders).map(|n| FlatRow {
            id: placeholder_id(n),
            kind: RowKind::Placeholder,
            depth: 0,
            has_children: false,
            expanded: false,
            pinned: false,
        }));
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        id: &str,
        depth: usize,
        pinned: bool,
        expansion: &ExpansionState,
        skip: &FxHashSet<&str>,
        seen: &mut FxHashSet<String>,
        out: &mut Vec<FlatRow>,
    ) {
        if skip.contains(id) || !seen.insert(id.to_string()) {
            return;
        }
        let Some(&kind) = self.kinds.get(id) else { return };
        let children = self.children(id);
        let expanded = !children.is_empty() && expansion.is_expanded(id);
        out.push(FlatRow {
            id: id.to_string(),
            kind: kind.into(),
            depth,
            has_children: !children.is_empty(),
            expanded,
            pinned,
        });
        if expanded {
            for child in children {
                self.walk(child, depth + 1, false, expansion, skip, seen, out);
            }
        }
    }
}

/// Estimated height plus per-row measurements, keyed by row id so they
/// survive re-flattening.
#[derive(Debug, Clone)]
pub struct RowHeights {
    estimated: f32,
    measured: FxHashMap<String, f32>,
}

impl RowHeights {
    pub fn new(estimated: f32) -> Self {
        Self {
            estimated: estimated.max(1.0),
            measured: FxHashMap::default(),
        }
    }

    pub fn measure(&mut self, row_id: &str, height: f32) {
        if height > 0.0 {
            self.measured.insert(row_id.to_string(), height);
        }
    }

    pub fn height(&self, row_id: &str) -> f32 {
        self.measured.get(row_id).copied().unwrap_or(self.estimated)
    }
}

/// Slice of rows to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleWindow {
    /// First row index (inclusive), overscan included.
    pub start: usize,
    /// Last row index (exclusive), overscan included.
    pub end: usize,
    /// Y offset of `start`.
    pub offset_top: f32,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cumulative row offsets for one flattened row list.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    // offsets[i] = top of row i; offsets[n] = total height
    offsets: Vec<f32>,
}

impl RowLayout {
    pub fn new(rows: &[FlatRow], heights: &RowHeights) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut y = 0.0;
        offsets.push(y);
        for row in rows {
            y += heights.height(&row.id);
            offsets.push(y);
        }
        Self { offsets }
    }

    pub fn row_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn total_height(&self) -> f32 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    pub fn row_top(&self, index: usize) -> Option<f32> {
        (index < self.row_count()).then(|| self.offsets[index])
    }

    /// Row under the given y offset.
    pub fn row_at_offset(&self, y: f32) -> Option<usize> {
        if self.row_count() == 0 || y < 0.0 || y >= self.total_height() {
            return None;
        }
        Some(self.offsets[1..].partition_point(|&bottom| bottom <= y))
    }

    /// Rows intersecting `[scroll_top, scroll_top + viewport_height)`, widened
    /// by `overscan` rows on each side.
    pub fn window(&self, scroll_top: f32, viewport_height: f32, overscan: usize) -> VisibleWindow {
        let count = self.row_count();
        if count == 0 || viewport_height <= 0.0 {
            return VisibleWindow { start: 0, end: 0, offset_top: 0.0 };
        }
        let top = scroll_top.clamp(0.0, self.total_height());
        let bottom = top + viewport_height;
        let first = self.offsets[1..].partition_point(|&b| b <= top).min(count - 1);
        let last = self.offsets[..count].partition_point(|&t| t < bottom).max(first + 1);
        let start = first.saturating_sub(overscan);
        let end = (last + overscan).min(count);
        VisibleWindow {
            start,
            end,
            offset_top: self.offsets[start],
        }
    }
}

/// Fires once per row count when the viewport bottom comes within
/// `threshold` of the end of the list.
#[derive(Debug, Clone)]
pub struct LoadMoreTrigger {
    threshold: f32,
    fired_at: Option<usize>,
}

impl LoadMoreTrigger {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            fired_at: None,
        }
    }

    pub fn check(&mut self, layout: &RowLayout, scroll_top: f32, viewport_height: f32) -> bool {
        let count = layout.row_count();
        if count == 0 {
            return false;
        }
        let remaining = layout.total_height() - (scroll_top + viewport_height);
        if remaining > self.threshold || self.fired_at == Some(count) {
            return false;
        }
        log::debug!("requesting more rows at {count}");
        self.fired_at = Some(count);
        true
    }

    pub fn reset(&mut self) {
        self.fired_at = None;
    }
}
