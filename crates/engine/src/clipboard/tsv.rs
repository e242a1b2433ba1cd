//! Clipboard text format: tab-separated, `\n`-terminated, every field
//! wrapped in double quotes with inner quotes doubled.

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::error::ClipboardError;

/// One line of pasted text after tab-splitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedClipboardRow {
    pub values: Vec<String>,
}

pub fn write_tsv<R, S>(rows: R) -> Result<String, ClipboardError>
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Parse pasted text. Quoting is optional so text from other applications
/// (plain `a\tb` lines) parses too. A blank line between rows is kept as a
/// single empty value; blank lines at either end are dropped. `\r\n` is
/// accepted.
pub fn parse_tsv(text: &str) -> Result<Vec<ParsedClipboardRow>, ClipboardError> {
    // None marks a blank line
    let mut lines: Vec<Option<ParsedClipboardRow>> = Vec::new();
    for line in split_lines(text) {
        if line.trim_end_matches('\r').is_empty() {
            lines.push(None);
            continue;
        }
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        for record in reader.records() {
            let record = record?;
            lines.push(Some(ParsedClipboardRow {
                values: record.iter().map(str::to_string).collect(),
            }));
        }
    }

    while matches!(lines.last(), Some(None)) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.is_none()).count();
    Ok(lines
        .into_iter()
        .skip(leading)
        .map(|line| line.unwrap_or_else(|| ParsedClipboardRow { values: vec![String::new()] }))
        .collect())
}

/// Split on `\n` outside quoted fields. A quote only opens at the start of a
/// field and `""` inside a quoted field is an escaped quote.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut field_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if quoted {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    quoted = false;
                }
            }
            field_start = false;
        } else {
            match b {
                b'"' if field_start => quoted = true,
                b'\n' => {
                    lines.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
            field_start = matches!(b, b'\t' | b'\n' | b'\r');
        }
        i += 1;
    }
    lines.push(&text[start..]);
    lines
}
