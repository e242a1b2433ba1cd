//! End-to-end behaviour of a grid session: selection, clipboard, editing
//! and the commit pipeline against a recording sink.

use serde_json::json;

use taskgrid_config::keybindings::KeybindingManager;
use taskgrid_config::schema::ProjectSchema;
use taskgrid_config::settings::Settings;
use taskgrid_core::columns::ColumnEvent;
use taskgrid_core::CellId;
use taskgrid_engine::clipboard::{CopyOptions, MemoryClipboard};
use taskgrid_engine::editing::{CommitTrigger, ValueSource};
use taskgrid_engine::notify::NotificationLevel;
use taskgrid_engine::shortcuts::{DocumentShortcuts, GridCommand};
use taskgrid_engine::update::RecordingSink;
use taskgrid_engine::validation::NoValidation;
use taskgrid_engine::{Entity, EntityStore, EntityUpdate, FieldValue, GridSession, RejectStage};

const SCHEMA: &str = r#"
statuses = ["not_started", "in_progress", "approved"]
folder_types = ["Episode", "Sequence", "Shot"]
task_types = ["Animation", "Compositing"]

[[columns]]
id = "attrib_fps"
type = "number"
"#;

fn entities() -> EntityStore {
    let rows = json!([
        {"kind": "folder", "id": "ep01", "name": "ep01", "folderType": "Episode", "status": "not_started",
         "attrib": {"fps": 24}, "ownAttrib": ["fps"]},
        {"kind": "folder", "id": "seq01", "name": "seq01", "folderType": "Sequence", "status": "not_started",
         "parentId": "ep01", "parents": ["ep01"], "attrib": {"fps": 24}},
        {"kind": "folder", "id": "sh010", "name": "Shot010", "folderType": "Shot", "status": "in_progress",
         "parentId": "seq01", "parents": ["ep01", "seq01"], "attrib": {"fps": 25}, "ownAttrib": ["fps"]},
        {"kind": "folder", "id": "sh020", "name": "Shot020", "folderType": "Shot", "status": "not_started",
         "parentId": "seq01", "parents": ["ep01", "seq01"], "attrib": {"fps": 24}},
        {"kind": "task", "id": "t-anim", "name": "animation", "taskType": "Animation", "status": "not_started",
         "folderId": "sh010", "parents": ["ep01", "seq01", "Shot010"], "attrib": {"fps": 25}},
        {"kind": "task", "id": "t-comp", "name": "compositing", "taskType": "Compositing", "status": "not_started",
         "folderId": "sh010", "parents": ["ep01", "seq01", "Shot010"], "attrib": {"fps": 25}}
    ]);
    let rows: Vec<Entity> = serde_json::from_value(rows).unwrap();
    EntityStore::from_entities(rows)
}

fn session() -> GridSession {
    let schema = ProjectSchema::from_toml_str(SCHEMA).unwrap();
    let mut session = GridSession::new("demo", &schema, Settings::default(), entities());
    for row in ["ep01", "seq01", "sh010"] {
        session.set_expanded(row, true);
    }
    session
}

fn cell(row: &str, col: &str) -> CellId {
    CellId::new(row, col)
}

/// seq01, sh010, t-anim, t-comp, sh020 in display order.
fn select_five_status_cells(session: &mut GridSession) {
    session.click_cell(&cell("seq01", "status"), false, false);
    session.click_cell(&cell("sh020", "status"), true, false);
    assert_eq!(session.selection().len(), 5);
}

#[test]
fn display_order_follows_expansion() {
    let session = session();
    let ids: Vec<&str> = session.rows().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["ep01", "seq01", "sh010", "t-anim", "t-comp", "sh020"]);
}

#[test]
fn copy_with_headers_matches_clipboard_format() {
    let mut session = session();
    session.click_cell(&cell("sh010", "name"), false, false);
    session.click_cell(&cell("sh010", "status"), false, true);
    let text = session
        .copy_text(CopyOptions { headers: true, full_row: false })
        .unwrap();
    assert_eq!(text, "\"name\"\t\"status\"\n\"ep01/seq01/Shot010\"\t\"in_progress\"\n");
}

#[test]
fn copy_writes_system_clipboard() {
    let mut session = session();
    session.click_cell(&cell("t-anim", "subType"), false, false);
    let clipboard = MemoryClipboard::new();
    assert!(smol::block_on(session.copy(&clipboard)));
    assert_eq!(clipboard.text().as_deref(), Some("\"Animation\"\n"));

    let denied = MemoryClipboard::denied();
    assert!(!smol::block_on(session.copy(&denied)));
    assert_eq!(session.selection().len(), 1);
}

#[test]
fn single_value_paste_broadcasts() {
    let mut session = session();
    for (i, row) in ["sh010", "t-anim", "t-comp"].into_iter().enumerate() {
        session.click_cell(&cell(row, "status"), false, i > 0);
    }
    let sink = RecordingSink::new();
    let applied = smol::block_on(session.paste_text("\"approved\"", &NoValidation, &sink)).unwrap();

    assert_eq!(applied.updates.len(), 3);
    assert_eq!(sink.call_count(), 1);
    for update in &sink.calls()[0] {
        assert_eq!(update.field, "status");
        assert_eq!(update.value, FieldValue::text("approved"));
    }
    assert_eq!(session.entities().get("t-comp").unwrap().status(), "approved");
}

#[test]
fn two_row_block_tiles_over_five_rows() {
    let mut session = session();
    select_five_status_cells(&mut session);
    let sink = RecordingSink::new();
    smol::block_on(session.paste_text("approved\nin_progress\n", &NoValidation, &sink)).unwrap();

    let calls = sink.calls();
    let by_row: Vec<(&str, String)> = calls[0]
        .iter()
        .map(|u| (u.id.as_str(), u.value.to_clipboard_text()))
        .collect();
    assert_eq!(
        by_row,
        vec![
            ("seq01", "approved".to_string()),
            ("sh010", "in_progress".to_string()),
            ("t-anim", "approved".to_string()),
            ("t-comp", "in_progress".to_string()),
            ("sh020", "approved".to_string()),
        ]
    );
}

#[test]
fn one_invalid_cell_blocks_whole_paste() {
    let mut session = session();
    select_five_status_cells(&mut session);
    let sink = RecordingSink::new();
    let rejected = smol::block_on(session.paste_text(
        "approved\napproved\nbogus\napproved\napproved",
        &NoValidation,
        &sink,
    ))
    .unwrap_err();

    assert_eq!(rejected.stage, RejectStage::Validation);
    assert!(rejected.reason.contains("bogus"));
    assert_eq!(sink.call_count(), 0);
    assert_eq!(session.entities().get("seq01").unwrap().status(), "not_started");
    assert_eq!(session.notifications().last().unwrap().level, NotificationLevel::Error);
}

#[test]
fn two_columns_on_one_row_make_one_call() {
    let mut session = session();
    session.click_cell(&cell("t-anim", "status"), false, false);
    session.click_cell(&cell("t-anim", "attrib_fps"), false, true);
    let sink = RecordingSink::new();
    smol::block_on(session.paste_text("approved\t30", &NoValidation, &sink)).unwrap();

    assert_eq!(sink.call_count(), 1);
    let call = &sink.calls()[0];
    assert_eq!(call.len(), 2);
    assert!(call.iter().all(|u| u.id == "t-anim"));
    assert_eq!(call[1], EntityUpdate::attrib("t-anim", taskgrid_engine::EntityKind::Task, "fps", FieldValue::Number(30.0)));
}

#[test]
fn validator_message_is_surfaced_verbatim() {
    let mut session = session();
    session.click_cell(&cell("sh010", "status"), false, false);
    let sink = RecordingSink::new();
    let locked = |_: &[EntityUpdate]| Err::<(), _>("Shot010 is locked for review".to_string());
    let rejected = smol::block_on(session.paste_text("approved", &locked, &sink)).unwrap_err();

    assert_eq!(rejected.reason, "Shot010 is locked for review");
    assert_eq!(session.notifications().last().unwrap().message, "Shot010 is locked for review");
    assert_eq!(sink.call_count(), 0);
}

#[test]
fn sink_rejection_reverts_optimistic_update() {
    let mut session = session();
    session.click_cell(&cell("sh020", "status"), false, false);
    let sink = RecordingSink::failing("server unavailable");
    let rejected = smol::block_on(session.paste_text("approved", &NoValidation, &sink)).unwrap_err();

    assert_eq!(rejected.stage, RejectStage::Sink);
    assert_eq!(sink.call_count(), 1);
    assert_eq!(session.entities().get("sh020").unwrap().status(), "not_started");
    let toasts = session.drain_notifications();
    assert_eq!(toasts.last().unwrap().message, "server unavailable");
}

#[test]
fn paste_with_empty_clipboard_is_info_only() {
    let mut session = session();
    session.click_cell(&cell("sh020", "status"), false, false);
    let sink = RecordingSink::new();
    let applied = smol::block_on(session.paste(&MemoryClipboard::new(), &NoValidation, &sink)).unwrap();
    assert!(applied.is_noop());
    assert_eq!(session.notifications().last().unwrap().level, NotificationLevel::Info);

    let applied = smol::block_on(session.paste(&MemoryClipboard::denied(), &NoValidation, &sink)).unwrap();
    assert!(applied.is_noop());
    assert_eq!(sink.call_count(), 0);
    assert_eq!(session.selection().len(), 1);
}

#[test]
fn only_one_editor_at_a_time() {
    let mut session = session();
    let a = cell("sh010", "status");
    let b = cell("t-anim", "status");
    session.begin_edit(&a).unwrap();
    let transition = session.begin_edit(&b).unwrap();
    assert_eq!(transition.closed, Some(a));
    assert_eq!(session.editing_cell(), Some(&b));

    session.click_cell(&cell("t-comp", "name"), false, false);
    assert_eq!(session.editing_cell(), None);
    assert_eq!(session.selection().len(), 1);
}

#[test]
fn commit_edit_applies_to_selected_column() {
    let mut session = session();
    session.click_cell(&cell("t-anim", "status"), false, false);
    session.click_cell(&cell("t-comp", "status"), true, false);
    session.begin_edit(&cell("t-anim", "status")).unwrap();

    let sink = RecordingSink::new();
    let applied = smol::block_on(session.commit_edit("approved", CommitTrigger::Enter, &NoValidation, &sink)).unwrap();
    assert_eq!(applied.updates.len(), 2);
    assert_eq!(session.editing_cell(), None);

    session.begin_edit(&cell("t-anim", "status")).unwrap();
    let unchanged = smol::block_on(session.commit_edit("approved", CommitTrigger::Blur, &NoValidation, &sink)).unwrap();
    assert!(unchanged.is_noop());
    assert_eq!(sink.call_count(), 1);
}

#[test]
fn bulk_edit_with_unchanged_focused_cell_still_fills_column() {
    let mut session = session();
    session.click_cell(&cell("t-comp", "status"), false, false);
    let sink = RecordingSink::new();
    smol::block_on(session.paste_text("approved", &NoValidation, &sink)).unwrap();

    session.click_cell(&cell("t-anim", "status"), false, false);
    session.click_cell(&cell("t-comp", "status"), true, false);
    session.begin_edit(&cell("t-anim", "status")).unwrap();
    let applied = smol::block_on(session.commit_edit("not_started", CommitTrigger::Enter, &NoValidation, &sink)).unwrap();

    assert_eq!(applied.updates.len(), 1);
    assert_eq!(applied.updates[0].id, "t-comp");
    assert_eq!(session.entities().get("t-comp").unwrap().status(), "not_started");
}

#[test]
fn attrib_edit_reaches_inheriting_rows() {
    let mut session = session();
    let task_fps = cell("t-anim", "attrib_fps");

    session.begin_edit(&cell("sh010", "attrib_fps")).unwrap();
    let sink = RecordingSink::new();
    let applied = smol::block_on(session.commit_edit("30", CommitTrigger::Enter, &NoValidation, &sink)).unwrap();
    assert_eq!(applied.updates.len(), 1);
    let display = session.cell_display(&task_fps).unwrap();
    assert_eq!(display.value, FieldValue::Number(30.0));
    assert_eq!(display.source, ValueSource::Inherited);

    session.begin_edit(&cell("sh010", "attrib_fps")).unwrap();
    let failing = RecordingSink::failing("offline");
    smol::block_on(session.commit_edit("48", CommitTrigger::Enter, &NoValidation, &failing)).unwrap_err();
    assert_eq!(session.cell_display(&task_fps).unwrap().value, FieldValue::Number(30.0));
    assert_eq!(session.entities().get("t-comp").unwrap().attrib_value("fps"), FieldValue::Number(30.0));
}

#[test]
fn ragged_copy_with_headers() {
    let mut session = session();
    session.click_cell(&cell("sh010", "name"), false, false);
    session.click_cell(&cell("sh010", "status"), false, true);
    session.click_cell(&cell("t-anim", "status"), false, true);
    let text = session
        .copy_text(CopyOptions { headers: true, full_row: false })
        .unwrap();
    assert_eq!(
        text,
        "\"name\"\t\"status\"\n\"ep01/seq01/Shot010\"\t\"in_progress\"\n\"not_started\"\n"
    );
}

#[test]
fn copied_block_pastes_back_unchanged() {
    let mut session = session();
    let source = [("sh010", "status"), ("sh010", "attrib_fps"), ("t-anim", "status"), ("t-anim", "attrib_fps")];
    for (i, (row, col)) in source.into_iter().enumerate() {
        session.click_cell(&cell(row, col), false, i > 0);
    }
    let options = CopyOptions { headers: false, full_row: false };
    let copied = session.copy_text(options).unwrap();
    assert_eq!(copied, "\"in_progress\"\t\"25\"\n\"not_started\"\t\"25\"\n");

    let target = [("t-comp", "status"), ("t-comp", "attrib_fps"), ("sh020", "status"), ("sh020", "attrib_fps")];
    for (i, (row, col)) in target.into_iter().enumerate() {
        session.click_cell(&cell(row, col), false, i > 0);
    }
    let sink = RecordingSink::new();
    smol::block_on(session.paste_text(&copied, &NoValidation, &sink)).unwrap();

    assert_eq!(session.copy_text(options).unwrap(), copied);
    assert_eq!(session.entities().get("t-comp").unwrap().status(), "in_progress");
    assert_eq!(session.entities().get("sh020").unwrap().attrib_value("fps"), FieldValue::Number(25.0));
}

#[test]
fn blank_clipboard_line_pastes_empty_value() {
    let mut session = session();
    for (i, row) in ["sh010", "t-anim", "t-comp"].into_iter().enumerate() {
        session.click_cell(&cell(row, "label"), false, i > 0);
    }
    let sink = RecordingSink::new();
    smol::block_on(session.paste_text("hero\n\nfinal\n", &NoValidation, &sink)).unwrap();

    let calls = sink.calls();
    let values: Vec<(&str, String)> = calls[0]
        .iter()
        .map(|u| (u.id.as_str(), u.value.to_clipboard_text()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("sh010", "hero".to_string()),
            ("t-anim", String::new()),
            ("t-comp", "final".to_string()),
        ]
    );
}

#[test]
fn status_override_keeps_allowed_values() {
    let schema = ProjectSchema::from_toml_str(&format!("{SCHEMA}\n[[columns]]\nid = \"status\"\n")).unwrap();
    let mut session = GridSession::new("demo", &schema, Settings::default(), entities());
    session.set_expanded("ep01", true);
    session.click_cell(&cell("seq01", "status"), false, false);

    let sink = RecordingSink::new();
    let rejected = smol::block_on(session.paste_text("bogus", &NoValidation, &sink)).unwrap_err();
    assert_eq!(rejected.stage, RejectStage::Validation);
    assert_eq!(sink.call_count(), 0);
    smol::block_on(session.paste_text("approved", &NoValidation, &sink)).unwrap();
    assert_eq!(session.entities().get("seq01").unwrap().status(), "approved");
}

#[test]
fn sink_failure_does_not_reopen_editor() {
    let mut session = session();
    session.begin_edit(&cell("sh020", "attrib_fps")).unwrap();
    let sink = RecordingSink::failing("nope");
    let rejected = smol::block_on(session.commit_edit("30", CommitTrigger::Enter, &NoValidation, &sink)).unwrap_err();
    assert_eq!(rejected.stage, RejectStage::Sink);
    assert_eq!(session.editing_cell(), None);
    assert_eq!(session.entities().get("sh020").unwrap().attrib_value("fps"), FieldValue::Number(24.0));
}

#[test]
fn inherit_from_parent_clears_override() {
    let mut session = session();
    let shot_fps = cell("sh010", "attrib_fps");
    assert_eq!(session.cell_display(&shot_fps).unwrap().source, ValueSource::Own);

    let sink = RecordingSink::new();
    smol::block_on(session.inherit_from_parent(&shot_fps, &NoValidation, &sink)).unwrap();
    assert_eq!(sink.calls()[0][0].value, FieldValue::Null);

    let display = session.cell_display(&shot_fps).unwrap();
    assert_eq!(display.source, ValueSource::Inherited);
    assert_eq!(display.value, FieldValue::Number(24.0));
}

#[test]
fn collapsing_prunes_hidden_selection() {
    let mut session = session();
    session.click_cell(&cell("t-anim", "status"), false, false);
    session.click_cell(&cell("ep01", "status"), false, true);
    session.set_expanded("sh010", false);
    let selected: Vec<&str> = session.selection().selected().iter().map(|c| c.row_id()).collect();
    assert_eq!(selected, vec!["ep01"]);
}

#[test]
fn loading_rows_are_not_selectable() {
    let mut session = session();
    session.set_loading(true);
    let placeholder = session.rows().last().unwrap().id.clone();
    assert!(placeholder.starts_with("__loading__"));
    session.click_cell(&cell(&placeholder, "status"), false, false);
    assert!(session.selection().is_empty());
    assert!(session.begin_edit(&cell(&placeholder, "status")).is_err());
    assert!(!session.grid().contains_row(&placeholder));
}

#[test]
fn window_and_load_more() {
    let mut session = session();
    let window = session.window(0.0, 68.0);
    assert_eq!(window.start, 0);
    assert_eq!(session.window_rows(&window).len(), 6);
    assert!(session.on_scroll(0.0, 68.0));
    assert!(!session.on_scroll(0.0, 68.0));
}

#[test]
fn hidden_column_leaves_grid() {
    let mut session = session();
    session.click_cell(&cell("sh010", "tags"), false, false);
    session.apply_column_event(ColumnEvent::Pin("tags".into()));
    assert_eq!(session.grid().col_index("tags"), Some(0));
    session.apply_column_event(ColumnEvent::SetHidden { column: "tags".into(), hidden: true });
    assert!(!session.grid().contains_col("tags"));
    assert!(session.columns().pinned.is_empty());
    assert!(session.selection().is_empty());
}

#[test]
fn view_session_round_trip() {
    let mut session = session();
    session.pin_rows(["sh020"]);
    session.apply_column_event(ColumnEvent::Pin("status".into()));
    let saved = session.view_session();

    let schema = ProjectSchema::from_toml_str(SCHEMA).unwrap();
    let mut restored = GridSession::new("demo", &schema, Settings::default(), entities());
    restored.restore_view_session(saved);
    assert_eq!(restored.rows()[0].id, "sh020");
    assert!(restored.is_expanded("sh010"));
    assert_eq!(restored.grid().col_at(0), Some("status"));
}

#[test]
fn shortcuts_route_to_latest_session() {
    let document = DocumentShortcuts::new();
    let keys = KeybindingManager::default();
    let mut first = session();
    let mut second = session();
    first.bind_shortcuts(&document);
    second.bind_shortcuts(&document);

    assert_eq!(first.command_for_chord(&document, &keys, "ctrl+c"), None);
    assert_eq!(second.command_for_chord(&document, &keys, "cmd+c"), Some(GridCommand::Copy));

    second.unbind_shortcuts();
    assert_eq!(first.command_for_chord(&document, &keys, "ctrl+v"), Some(GridCommand::Paste));
    assert_eq!(document.bound_count(), 1);
}
