use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("nothing is selected")]
    NothingSelected,

    #[error("clipboard unavailable: {0}")]
    Provider(String),

    #[error("no entity for row '{0}'")]
    MissingEntity(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("tsv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("clipboard text is not utf-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("nothing to paste")]
    NothingToPaste,

    #[error("no cells selected to paste into")]
    NoTarget,

    #[error("row {row}, column {column}: {message}")]
    Invalid { row: String, column: String, message: String },

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

impl PasteError {
    pub(crate) fn invalid(row: &str, column: &str, message: impl Into<String>) -> Self {
        PasteError::Invalid {
            row: row.to_string(),
            column: column.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("no cell is being edited")]
    NotEditing,

    #[error("row '{0}' cannot be edited")]
    NotEditable(String),

    #[error("column '{0}' is read-only")]
    ReadOnly(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("no entity for row '{0}'")]
    MissingEntity(String),

    #[error("column '{0}' has no parent value to inherit")]
    NotInheritable(String),

    #[error("{0}")]
    Invalid(String),
}
