//! Cell identity for the entity grid.
//!
//! A `CellId` names one (row, column) pair. Rows are entity ids and columns
//! are field ids, both arbitrary strings, so the encoded form escapes the
//! delimiter and the escape character itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delimiter between the row part and the column part of an encoded id.
pub const DELIMITER: char = '|';
const ESCAPE: char = '\\';

/// Pseudo-column used by row-header clicks. Never copied or pasted.
pub const ROW_SELECTION_COLUMN: &str = "__row_selection__";

/// Prefix of synthetic row ids shown while data is loading.
pub const PLACEHOLDER_ROW_PREFIX: &str = "__loading__";

/// Returns true for synthetic loading rows.
pub fn is_placeholder_row(row_id: &str) -> bool {
    row_id.starts_with(PLACEHOLDER_ROW_PREFIX)
}

/// Unique identifier for one cell of the grid.
///
/// Serializes as its encoded string so it can be used directly as a JSON map key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    row: String,
    col: String,
}

impl CellId {
    pub fn new(row_id: impl Into<String>, col_id: impl Into<String>) -> Self {
        Self {
            row: row_id.into(),
            col: col_id.into(),
        }
    }

    /// The row-header pseudo-cell of a row.
    pub fn row_selection(row_id: impl Into<String>) -> Self {
        Self::new(row_id, ROW_SELECTION_COLUMN)
    }

    #[inline]
    pub fn row_id(&self) -> &str {
        &self.row
    }

    #[inline]
    pub fn col_id(&self) -> &str {
        &self.col
    }

    pub fn is_row_selection(&self) -> bool {
        self.col == ROW_SELECTION_COLUMN
    }

    /// Encoded string form: `row|col` with `\` and `|` escaped.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.row.len() + self.col.len() + 1);
        push_escaped(&mut out, &self.row);
        out.push(DELIMITER);
        push_escaped(&mut out, &self.col);
        out
    }

    /// Parse an encoded id. Returns `None` unless there is exactly one
    /// unescaped delimiter and no dangling escape.
    pub fn decode(encoded: &str) -> Option<Self> {
        let mut parts: Vec<String> = vec![String::new()];
        let mut chars = encoded.chars();
        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => {
                    let next = chars.next()?;
                    parts.last_mut()?.push(next);
                }
                DELIMITER => {
                    if parts.len() == 2 {
                        return None;
                    }
                    parts.push(String::new());
                }
                other => parts.last_mut()?.push(other),
            }
        }
        if parts.len() != 2 {
            return None;
        }
        let col = parts.pop()?;
        let row = parts.pop()?;
        Some(Self { row, col })
    }
}

fn push_escaped(out: &mut String, raw: &str) {
    for ch in raw.chars() {
        if ch == ESCAPE || ch == DELIMITER {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.encode()
    }
}

impl TryFrom<String> for CellId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CellId::decode(&value).ok_or_else(|| format!("malformed cell id: {value:?}"))
    }
}
