// Configuration loading

pub mod error;
pub mod keybindings;
pub mod schema;
pub mod session;
pub mod settings;

pub use error::ConfigError;

use std::path::PathBuf;

/// Directory holding every taskgrid config file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskgrid")
}

/// Drop `//` comment lines so hand-edited JSON config files still parse.
pub(crate) fn strip_line_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}
