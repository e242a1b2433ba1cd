//! CLI Exit Code Registry
//!
//! Single source of truth for `tgrid` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | Paste or validation failure (nothing was applied)         |
//! | 2    | Usage error (bad arguments, unknown row or column)        |
//! | 3    | I/O error (unreadable snapshot, schema or clipboard text) |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The paste batch was refused by validation or the sink.
pub const EXIT_REJECTED: u8 = 1;

/// Usage error - bad arguments, ids missing from the grid.
pub const EXIT_USAGE: u8 = 2;

/// A file could not be read, parsed or written.
pub const EXIT_IO: u8 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_REJECTED, EXIT_USAGE, EXIT_IO];
        for (i, a) in codes.iter().enumerate() {
            assert!(codes[i + 1..].iter().all(|b| a != b));
        }
    }
}
