//! CSV export of the current selection as a downloadable file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::IoError;

pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub mime: &'static str,
    pub contents: String,
}

impl CsvExport {
    /// Export dated today (local time).
    pub fn from_text(project: &str, cell_count: usize, contents: String) -> Self {
        Self::dated(project, cell_count, contents, Local::now().date_naive())
    }

    pub fn dated(project: &str, cell_count: usize, contents: String, date: NaiveDate) -> Self {
        Self {
            file_name: file_name(project, cell_count, date),
            mime: CSV_MIME,
            contents,
        }
    }

    /// Write into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, IoError> {
        fs::create_dir_all(dir).map_err(|e| IoError::io(dir, e))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.contents).map_err(|e| IoError::io(&path, e))?;
        log::info!("exported {} bytes to {}", self.contents.len(), path.display());
        Ok(path)
    }
}

/// `{project}-export-{count}_cells-{YYYY-MM-DD}.csv`. Path separators in the
/// project name are replaced so the name stays a single file.
pub fn file_name(project: &str, cell_count: usize, date: NaiveDate) -> String {
    let project: String = project
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{project}-export-{cell_count}_cells-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("demo", 12, date()), "demo-export-12_cells-2026-03-09.csv");
        assert_eq!(file_name("a/b", 1, date()), "a_b-export-1_cells-2026-03-09.csv");
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let export = CsvExport::dated("demo", 2, "\"name\"\n\"sh010\"\n".into(), date());
        assert_eq!(export.mime, "text/csv");
        let path = export.write_to(dir.path()).unwrap();
        assert!(path.ends_with("demo-export-2_cells-2026-03-09.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "\"name\"\n\"sh010\"\n");
    }
}
