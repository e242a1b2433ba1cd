// End-to-end tests for the `tgrid` binary.
// Run with: cargo test -p taskgrid-cli --test cli_tests

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const SNAPSHOT: &str = r#"{
  "name": "demo",
  "folders": [
    {"id": "ep01", "name": "ep01", "folderType": "Episode"},
    {"id": "seq01", "name": "seq01", "folderType": "Sequence", "parentId": "ep01", "parents": ["ep01"]},
    {"id": "sh010", "name": "Shot010", "folderType": "Shot", "status": "in_progress",
     "parentId": "seq01", "parents": ["ep01", "seq01"]},
    {"id": "sh020", "name": "Shot020", "folderType": "Shot", "status": "not_started",
     "parentId": "seq01", "parents": ["ep01", "seq01"]}
  ],
  "tasks": [
    {"id": "t-anim", "name": "animation", "taskType": "Animation", "folderId": "sh010",
     "parents": ["ep01", "seq01", "Shot010"]}
  ]
}"#;

const SCHEMA: &str = r#"
statuses = ["not_started", "in_progress", "approved"]
folder_types = ["Episode", "Sequence", "Shot"]
task_types = ["Animation"]

[[columns]]
id = "attrib_fps"
type = "number"
"#;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("demo.json"), SNAPSHOT).unwrap();
        fs::write(dir.path().join("columns.toml"), SCHEMA).unwrap();
        Self { dir }
    }

    fn project(&self) -> PathBuf {
        self.dir.path().join("demo.json")
    }

    fn schema(&self) -> PathBuf {
        self.dir.path().join("columns.toml")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn tgrid() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tgrid"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(cmd: &mut Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn tgrid");
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn copy_prints_quoted_tsv_with_headers() {
    let fx = Fixture::new();
    let output = tgrid()
        .arg("copy")
        .arg("--project")
        .arg(fx.project())
        .args(["--rows", "sh010", "--cols", "name,status", "--headers"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "\"name\"\t\"status\"\n\"ep01/seq01/Shot010\"\t\"in_progress\"\n");
}

#[test]
fn copy_full_row_covers_every_column() {
    let fx = Fixture::new();
    let output = tgrid()
        .arg("copy")
        .arg("--project")
        .arg(fx.project())
        .args(["--rows", "sh020", "--full-row"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let line = text.lines().next().unwrap();
    assert!(line.starts_with("\"ep01/seq01/Shot020\"\t"), "{line}");
    assert_eq!(line.split('\t').count(), 6);
}

#[test]
fn paste_broadcasts_single_value() {
    let fx = Fixture::new();
    let output = run_with_stdin(
        tgrid()
            .arg("paste")
            .arg("--project")
            .arg(fx.project())
            .arg("--schema")
            .arg(fx.schema())
            .args(["--rows", "sh010,sh020", "--cols", "status"]),
        "\"approved\"",
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let updates: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let updates = updates.as_array().unwrap();
    assert_eq!(updates.len(), 2);
    for update in updates {
        assert_eq!(update["field"], "status");
        assert_eq!(update["value"], "approved");
        assert_eq!(update["type"], "folder");
    }
}

#[test]
fn paste_from_file_coerces_numbers() {
    let fx = Fixture::new();
    let text = fx.path().join("fps.tsv");
    fs::write(&text, "24\n").unwrap();
    let output = tgrid()
        .arg("paste")
        .arg("--project")
        .arg(fx.project())
        .arg("--schema")
        .arg(fx.schema())
        .args(["--rows", "sh010", "--cols", "attrib_fps", "--text"])
        .arg(&text)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let updates: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        updates,
        serde_json::json!([{"id": "sh010", "type": "folder", "field": "fps", "value": 24.0, "isAttrib": true}])
    );
}

#[test]
fn paste_invalid_value_is_rejected() {
    let fx = Fixture::new();
    let output = run_with_stdin(
        tgrid()
            .arg("paste")
            .arg("--project")
            .arg(fx.project())
            .arg("--schema")
            .arg(fx.schema())
            .args(["--rows", "sh010,sh020", "--cols", "status"]),
        "\"bogus\"",
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not a valid status"), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn export_writes_dated_csv() {
    let fx = Fixture::new();
    let out = fx.path().join("exports");
    let output = tgrid()
        .arg("export")
        .arg("--project")
        .arg(fx.project())
        .args(["--rows", "sh010,sh020", "--cols", "name", "--out"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let path = PathBuf::from(stdout(&output).trim());
    let file_name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(file_name.starts_with("demo-export-2_cells-"), "{file_name}");
    assert!(file_name.ends_with(".csv"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\"name\"\n\"ep01/seq01/Shot010\"\n\"ep01/seq01/Shot020\"\n"
    );
}

#[test]
fn unknown_row_is_usage_error() {
    let fx = Fixture::new();
    let output = tgrid()
        .arg("copy")
        .arg("--project")
        .arg(fx.project())
        .args(["--rows", "nope", "--cols", "name"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("row 'nope' is not in the project"));
}

#[test]
fn unknown_column_lists_available_columns() {
    let fx = Fixture::new();
    let output = tgrid()
        .arg("copy")
        .arg("--project")
        .arg(fx.project())
        .args(["--rows", "sh010", "--cols", "frames"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("unknown column 'frames'"));
    assert!(err.contains("hint:  available columns: name"));
}

#[test]
fn missing_snapshot_is_io_error() {
    let fx = Fixture::new();
    let output = tgrid()
        .arg("copy")
        .arg("--project")
        .arg(fx.path().join("missing.json"))
        .args(["--rows", "sh010"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).starts_with("error: "));
}
