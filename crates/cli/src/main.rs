// tgrid - headless copy, paste and export over a project grid

mod exit_codes;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskgrid_config::schema::ProjectSchema;
use taskgrid_config::settings::Settings;
use taskgrid_core::CellId;
use taskgrid_engine::update::RecordingSink;
use taskgrid_engine::validation::NoValidation;
use taskgrid_engine::{ClipboardError, EntityKind, GridSession, RejectStage};
use taskgrid_io::{CsvExport, ProjectSnapshot};

use exit_codes::{EXIT_IO, EXIT_REJECTED, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "tgrid")]
#[command(about = "Copy, paste and export project grid cells (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the selected cells as clipboard text (tab separated, quoted)
    #[command(after_help = "\
Examples:
  tgrid copy --project demo.json --rows sh010 --cols name,status --headers
  tgrid copy --project demo.json --rows sh010,sh020 --full-row")]
    Copy {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// Paste clipboard text onto the selected cells and print the update batch
    #[command(after_help = "\
Nothing is sent anywhere: the batch is printed as JSON instead.

Examples:
  printf '\"approved\"' | tgrid paste --project demo.json --rows sh010,sh020 --cols status
  tgrid paste --project demo.json --schema columns.toml --rows sh010 --cols attrib_fps --text fps.tsv")]
    Paste {
        #[command(flatten)]
        grid: GridArgs,

        /// Read clipboard text from this file instead of stdin
        #[arg(long)]
        text: Option<PathBuf>,
    },

    /// Write the selected cells as a CSV export file
    Export {
        #[command(flatten)]
        grid: GridArgs,

        /// Directory the export file is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Project snapshot (JSON: name, folders, tasks)
    #[arg(long)]
    project: PathBuf,

    /// Project column schema (TOML)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Row ids to select, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    rows: Vec<String>,

    /// Column ids to select, comma separated. Omit to select whole rows.
    #[arg(long, value_delimiter = ',')]
    cols: Vec<String>,

    /// Prefix the output with a header row of column ids
    #[arg(long)]
    headers: bool,

    /// Whole-row selections cover every visible column
    #[arg(long)]
    full_row: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Copy { grid } => cmd_copy(grid),
        Commands::Paste { grid, text } => cmd_paste(grid, text),
        Commands::Export { grid, out } => cmd_export(grid, out),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self { code: EXIT_REJECTED, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ClipboardError> for CliError {
    fn from(err: ClipboardError) -> Self {
        match err {
            ClipboardError::NothingSelected => CliError::usage("nothing selected"),
            other => CliError::rejected(other.to_string()),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_copy(args: GridArgs) -> Result<(), CliError> {
    let session = open_session(&args)?;
    let text = session.copy_text(session.copy_options())?;
    write_stdout(&text)
}

fn cmd_paste(args: GridArgs, text: Option<PathBuf>) -> Result<(), CliError> {
    let mut session = open_session(&args)?;
    let text = match text {
        Some(path) => read_file(&path)?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::io(format!("cannot read stdin: {}", e)))?;
            buf
        }
    };

    let sink = RecordingSink::new();
    let result = smol::block_on(session.paste_text(&text, &NoValidation, &sink));
    for note in session.drain_notifications() {
        log::info!("{}", note.message);
    }

    match result {
        Ok(applied) => {
            let json = serde_json::to_string_pretty(&applied.updates)
                .map_err(|e| CliError::io(format!("cannot encode updates: {}", e)))?;
            write_stdout(&format!("{json}\n"))
        }
        Err(rejected) => {
            let hint = match rejected.stage {
                RejectStage::Validation => "no updates were produced; fix the pasted values and retry",
                RejectStage::Sink => "the update batch was refused",
            };
            Err(CliError::rejected(rejected.reason).with_hint(hint))
        }
    }
}

fn cmd_export(args: GridArgs, out: PathBuf) -> Result<(), CliError> {
    let session = open_session(&args)?;
    let contents = session.export_csv_text()?;
    let export = CsvExport::from_text(session.project(), session.selection().len(), contents);
    let path = export.write_to(&out).map_err(|e| CliError::io(e.to_string()))?;
    write_stdout(&format!("{}\n", path.display()))
}

// ============================================================================
// Session setup
// ============================================================================

/// Load the snapshot, expand every folder and select the requested cells.
fn open_session(args: &GridArgs) -> Result<GridSession, CliError> {
    let snapshot = ProjectSnapshot::load(&args.project).map_err(|e| CliError::io(e.to_string()))?;
    let schema = match &args.schema {
        Some(path) => ProjectSchema::load(path).map_err(|e| CliError::io(e.to_string()))?,
        None => ProjectSchema::default(),
    };
    let settings = Settings {
        copy_headers: args.headers,
        copy_full_row: args.full_row,
        ..Settings::default()
    };

    let project = snapshot.name.clone();
    let entities = snapshot.into_store();
    let folders: Vec<String> = entities
        .iter()
        .filter(|e| e.kind() == EntityKind::Folder)
        .map(|e| e.id().to_string())
        .collect();

    let mut session = GridSession::new(project, &schema, settings, entities);
    for id in &folders {
        session.set_expanded(id, true);
    }
    select_cells(&mut session, &args.rows, &args.cols)?;
    Ok(session)
}

fn select_cells(session: &mut GridSession, rows: &[String], cols: &[String]) -> Result<(), CliError> {
    let rows = dedup(rows);
    let cols = dedup(cols);

    for row in &rows {
        if !session.grid().contains_row(row) {
            return Err(CliError::usage(format!("row '{}' is not in the project", row))
                .with_hint("row ids are folder and task ids from the snapshot"));
        }
    }
    for col in &cols {
        if !session.grid().contains_col(col) {
            let known = session.grid().col_ids().join(", ");
            return Err(CliError::usage(format!("unknown column '{}'", col))
                .with_hint(format!("available columns: {}", known)));
        }
    }

    for row in &rows {
        if cols.is_empty() {
            session.click_row(row, false, true);
        } else {
            for col in &cols {
                session.click_cell(&CellId::new(row.as_str(), col.as_str()), false, true);
            }
        }
    }
    Ok(())
}

/// First occurrence wins; a repeated id would toggle itself back out.
fn dedup(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))
}

fn write_stdout(text: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    let fail = |e: io::Error| CliError::io(format!("cannot write output: {}", e));
    stdout.write_all(text.as_bytes()).map_err(fail)?;
    stdout.flush().map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_order() {
        let ids: Vec<String> = ["b", "a", " b ", "", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup(&ids), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_nothing_selected_is_usage_error() {
        let err: CliError = ClipboardError::NothingSelected.into();
        assert_eq!(err.code, EXIT_USAGE);
    }
}
