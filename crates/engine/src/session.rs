//! Grid session: the store a frontend drives.
//!
//! Owns the entity store, field registry, column and row layout state, the
//! selection and editing stores and the notification queue. Every change to
//! the visible row or column set goes through [`GridSession::rebuild`]:
//! flatten rows, rebuild the grid map, prune the selection.
//!
//! Commits (paste, edit, inherit) share one pipeline: validation hook,
//! optimistic local apply, update sink. A sink rejection reverts the local
//! apply and raises an error notification; the editor is not reopened.

use taskgrid_config::keybindings::KeybindingManager;
use taskgrid_config::schema::ProjectSchema;
use taskgrid_config::session::ViewSession;
use taskgrid_config::settings::Settings;
use taskgrid_core::columns::{self, ColumnEvent, ColumnState, RowPins};
use taskgrid_core::{CellId, GridMap, SelectionOptions, SelectionStore};

use crate::clipboard::{
    parse_tsv, plan_paste, serialize_selection, ClipboardProvider, CopyOptions, GridView,
};
use crate::editing::{self, CellDisplay, CommitTrigger, EditTransition, EditingStore};
use crate::entity::EntityStore;
use crate::error::{ClipboardError, EditError, PasteError};
use crate::fields::FieldRegistry;
use crate::notify::{Notification, Notifications};
use crate::rows::{ExpansionState, FlatRow, LoadMoreTrigger, RowHeights, RowKind, RowLayout, RowTree, VisibleWindow};
use crate::shortcuts::{DocumentShortcuts, GridCommand, ShortcutGuard};
use crate::update::{entity_count, Applied, CommitResult, RejectStage, Rejected, UpdateBatch, UpdateSink};
use crate::validation::UpdateValidator;

pub struct GridSession {
    project: String,
    settings: Settings,
    entities: EntityStore,
    fields: FieldRegistry,
    columns: ColumnState,
    pins: RowPins,
    expansion: ExpansionState,
    rows: Vec<FlatRow>,
    grid: GridMap,
    heights: RowHeights,
    layout: RowLayout,
    load_more: LoadMoreTrigger,
    loading: bool,
    selection: SelectionStore,
    editing: EditingStore,
    notifications: Notifications,
    shortcuts: Option<ShortcutGuard>,
}

impl GridSession {
    pub fn new(project: impl Into<String>, schema: &ProjectSchema, settings: Settings, entities: EntityStore) -> Self {
        let fields = FieldRegistry::from_schema(schema);
        let columns = ColumnState::new(fields.column_ids());
        let selection = SelectionStore::new(SelectionOptions {
            click_to_deselect: settings.click_to_deselect,
        });
        let mut session = Self {
            project: project.into(),
            heights: RowHeights::new(settings.estimated_row_height),
            load_more: LoadMoreTrigger::new(settings.load_more_threshold),
            settings,
            entities,
            fields,
            columns,
            pins: RowPins::default(),
            expansion: ExpansionState::default(),
            rows: Vec::new(),
            grid: GridMap::default(),
            layout: RowLayout::default(),
            loading: false,
            selection,
            editing: EditingStore::new(),
            notifications: Notifications::default(),
            shortcuts: None,
        };
        session.rebuild();
        session
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn columns(&self) -> &ColumnState {
        &self.columns
    }

    pub fn pinned_rows(&self) -> &RowPins {
        &self.pins
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn editing_cell(&self) -> Option<&CellId> {
        self.editing.editing()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn view(&self) -> GridView<'_> {
        GridView {
            grid: &self.grid,
            entities: &self.entities,
            fields: &self.fields,
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Flatten rows, rebuild the grid map and prune stale selection.
    pub fn rebuild(&mut self) {
        let tree = RowTree::build(&self.entities);
        let placeholders = if self.loading { self.settings.placeholder_rows } else { 0 };
        self.rows = tree.flatten(&self.expansion, &self.pins, placeholders);
        let visible_columns: Vec<String> = self
            .columns
            .visible_columns()
            .into_iter()
            .filter(|c| self.fields.get(c).is_some())
            .collect();
        self.grid = GridMap::new(
            self.rows
                .iter()
                .filter(|r| r.kind != RowKind::Placeholder)
                .map(|r| r.id.as_str()),
            visible_columns,
        );
        self.layout = RowLayout::new(&self.rows, &self.heights);
        self.selection.prune(&self.grid);
        if let Some(cell) = self.editing.editing() {
            if !self.grid.contains_cell(cell) {
                self.editing.finish();
            }
        }
        log::debug!("rebuilt grid: {} rows x {} columns", self.grid.row_count(), self.grid.col_count());
    }

    /// Replace the loaded entities (data refresh).
    pub fn set_entities(&mut self, entities: EntityStore) {
        self.entities = entities;
        self.load_more.reset();
        self.rebuild();
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.rebuild();
        }
    }

    pub fn apply_column_event(&mut self, event: ColumnEvent) {
        self.columns = columns::apply_column_event(std::mem::take(&mut self.columns), &event);
        self.rebuild();
    }

    pub fn pin_rows<I>(&mut self, rows: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.pins = columns::pin_rows(std::mem::take(&mut self.pins), rows);
        self.rebuild();
    }

    pub fn unpin_rows<'a, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.pins = columns::unpin_rows(std::mem::take(&mut self.pins), rows);
        self.rebuild();
    }

    pub fn set_expanded(&mut self, row_id: &str, expanded: bool) {
        self.expansion.set(row_id, expanded);
        self.rebuild();
    }

    pub fn toggle_expanded(&mut self, row_id: &str) -> bool {
        let expanded = self.expansion.toggle(row_id);
        self.rebuild();
        expanded
    }

    pub fn is_expanded(&self, row_id: &str) -> bool {
        self.expansion.is_expanded(row_id)
    }

    pub fn measure_row(&mut self, row_id: &str, height: f32) {
        self.heights.measure(row_id, height);
        self.layout = RowLayout::new(&self.rows, &self.heights);
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Rows to render for the current scroll position.
    pub fn window(&self, scroll_top: f32, viewport_height: f32) -> VisibleWindow {
        self.layout.window(scroll_top, viewport_height, self.settings.overscan)
    }

    pub fn window_rows(&self, window: &VisibleWindow) -> &[FlatRow] {
        let end = window.end.min(self.rows.len());
        &self.rows[window.start.min(end)..end]
    }

    /// True when the caller should fetch the next page of rows.
    pub fn on_scroll(&mut self, scroll_top: f32, viewport_height: f32) -> bool {
        !self.loading && self.load_more.check(&self.layout, scroll_top, viewport_height)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Pointer click on a cell. An open editor on another cell closes
    /// (discarding its draft) before the click selects.
    pub fn click_cell(&mut self, cell: &CellId, extend: bool, toggle: bool) {
        if let Some(closed) = self.editing.click(cell) {
            log::debug!("click closed editor on {closed}");
        }
        self.selection.select_cell(cell, &self.grid, extend, toggle);
    }

    pub fn click_row(&mut self, row_id: &str, extend: bool, toggle: bool) {
        self.click_cell(&CellId::row_selection(row_id), extend, toggle);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.grid);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn move_focus(&mut self, d_row: isize, d_col: isize, extend: bool) {
        self.selection.move_focus(d_row, d_col, &self.grid, extend);
    }

    pub fn set_disabled_rows<I>(&mut self, rows: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.selection.set_disabled_rows(rows);
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            headers: self.settings.copy_headers,
            full_row: self.settings.copy_full_row,
        }
    }

    /// Selection as clipboard text.
    pub fn copy_text(&self, options: CopyOptions) -> Result<String, ClipboardError> {
        serialize_selection(self.selection.selected(), &self.view(), options).inspect_err(|e| {
            if !matches!(e, ClipboardError::NothingSelected) {
                log::error!("copy aborted: {e}");
            }
        })
    }

    /// Selection as CSV file contents. Headers are always included.
    pub fn export_csv_text(&self) -> Result<String, ClipboardError> {
        self.copy_text(CopyOptions {
            headers: true,
            ..self.copy_options()
        })
    }

    /// Copy the selection to the system clipboard. Returns false when
    /// nothing was written.
    pub async fn copy<C: ClipboardProvider>(&mut self, clipboard: &C) -> bool {
        let text = match self.copy_text(self.copy_options()) {
            Ok(text) => text,
            Err(_) => return false,
        };
        match clipboard.write_text(text).await {
            Ok(()) => {
                self.notifications.success(format!("Copied {} cells", self.selection.len()));
                true
            }
            Err(e) => {
                log::warn!("clipboard write failed: {e}");
                false
            }
        }
    }

    /// Read the system clipboard and paste onto the selection.
    pub async fn paste<C, V, S>(&mut self, clipboard: &C, validator: &V, sink: &S) -> CommitResult
    where
        C: ClipboardProvider,
        V: UpdateValidator,
        S: UpdateSink,
    {
        let text = match clipboard.read_text().await {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.notifications.info("Nothing to paste");
                return Ok(Applied::none());
            }
            Err(e) => {
                log::warn!("clipboard read failed: {e}");
                return Ok(Applied::none());
            }
        };
        self.paste_text(&text, validator, sink).await
    }

    /// Paste `text` onto the selection.
    pub async fn paste_text<V, S>(&mut self, text: &str, validator: &V, sink: &S) -> CommitResult
    where
        V: UpdateValidator,
        S: UpdateSink,
    {
        let rows = match parse_tsv(text) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("unreadable clipboard text: {e}");
                Vec::new()
            }
        };
        let full_row = self.settings.copy_full_row;
        let planned = plan_paste(&rows, self.selection.selected(), &self.view(), full_row);
        match planned {
            Ok(batch) => self.submit(batch, validator, sink).await,
            Err(PasteError::NothingToPaste) => {
                self.notifications.info("Nothing to paste");
                Ok(Applied::none())
            }
            Err(PasteError::NoTarget) => {
                self.notifications.info("Select cells to paste into");
                Ok(Applied::none())
            }
            Err(e) => Err(self.reject(RejectStage::Validation, e.to_string())),
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn begin_edit(&mut self, cell: &CellId) -> Result<EditTransition, EditError> {
        if !self.grid.contains_cell(cell) || !self.selection.is_row_selectable(cell.row_id()) {
            return Err(EditError::NotEditable(cell.row_id().to_string()));
        }
        let transition = self.editing.begin_edit(cell)?;
        if let Some(closed) = &transition.closed {
            log::debug!("discarded editor on {closed}");
        }
        Ok(transition)
    }

    pub fn cancel_edit(&mut self) -> Option<CellId> {
        self.editing.finish()
    }

    /// Commit `raw` into the editing cell. The editor closes before the sink
    /// is awaited. With apply-to-selection on and the cell selected, every
    /// selected cell of the same column gets the value too.
    pub async fn commit_edit<V, S>(&mut self, raw: &str, trigger: CommitTrigger, validator: &V, sink: &S) -> CommitResult
    where
        V: UpdateValidator,
        S: UpdateSink,
    {
        let Some(cell) = self.editing.finish() else {
            return Err(self.reject(RejectStage::Validation, EditError::NotEditing.to_string()));
        };
        let also: Vec<CellId> = if self.settings.apply_edit_to_selection && self.selection.is_selected(&cell) {
            self.selection.selected().iter().cloned().collect()
        } else {
            Vec::new()
        };
        match editing::plan_commit(&self.view(), &cell, raw, trigger, &also) {
            Ok(batch) => self.submit(batch, validator, sink).await,
            Err(e) => Err(self.reject(RejectStage::Validation, e.to_string())),
        }
    }

    /// Clear the cell's own attribute value so the parent value shows.
    pub async fn inherit_from_parent<V, S>(&mut self, cell: &CellId, validator: &V, sink: &S) -> CommitResult
    where
        V: UpdateValidator,
        S: UpdateSink,
    {
        match editing::plan_inherit(&self.view(), cell) {
            Ok(batch) => self.submit(batch, validator, sink).await,
            Err(e) => Err(self.reject(RejectStage::Validation, e.to_string())),
        }
    }

    pub fn cell_display(&self, cell: &CellId) -> Option<CellDisplay> {
        editing::cell_display(&self.view(), cell)
    }

    /// Validation hook, optimistic apply, sink. The sink is called at most
    /// once per batch and never when validation fails.
    async fn submit<V, S>(&mut self, batch: UpdateBatch, validator: &V, sink: &S) -> CommitResult
    where
        V: UpdateValidator,
        S: UpdateSink,
    {
        if batch.is_empty() {
            return Ok(Applied::none());
        }
        let updates = batch.into_vec();
        if let Err(message) = validator.validate(&updates) {
            return Err(self.reject(RejectStage::Validation, message));
        }

        let originals = self.entities.apply_updates(&updates);
        self.rebuild();
        log::debug!("sending {} updates for {} entities", updates.len(), entity_count(&updates));
        match sink.update_entities(updates.clone()).await {
            Ok(()) => Ok(Applied { updates }),
            Err(reason) => {
                self.entities.restore(originals);
                self.rebuild();
                Err(self.reject(RejectStage::Sink, reason))
            }
        }
    }

    fn reject(&mut self, stage: RejectStage, reason: String) -> Rejected {
        self.notifications.error(reason.clone());
        Rejected { stage, reason }
    }

    // ------------------------------------------------------------------
    // Shortcuts
    // ------------------------------------------------------------------

    /// Bind copy/paste chords for the document. Rebinding replaces the
    /// previous guard.
    pub fn bind_shortcuts(&mut self, document: &DocumentShortcuts) {
        self.shortcuts = Some(document.bind());
    }

    pub fn unbind_shortcuts(&mut self) {
        self.shortcuts = None;
    }

    /// Command this session should run for `chord`, if it is the active
    /// shortcut owner.
    pub fn command_for_chord(&self, document: &DocumentShortcuts, keys: &KeybindingManager, chord: &str) -> Option<GridCommand> {
        let guard = self.shortcuts.as_ref()?;
        let (owner, command) = document.dispatch(keys, chord)?;
        (owner == guard.id()).then_some(command)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn view_session(&self) -> ViewSession {
        ViewSession {
            expanded: self.expansion.as_map().clone(),
            columns: self.columns.clone(),
            pinned_rows: self.pins.clone(),
            ..ViewSession::default()
        }
    }

    /// Restore saved expansion, pins and column state. Columns no longer in
    /// the schema are dropped.
    pub fn restore_view_session(&mut self, saved: ViewSession) {
        self.expansion = ExpansionState::from_map(saved.expanded);
        self.pins = saved.pinned_rows;
        let known: Vec<String> = self.fields.column_ids().map(str::to_string).collect();
        self.columns = columns::apply_column_event(saved.columns, &ColumnEvent::SetColumns(known));
        self.rebuild();
    }
}
