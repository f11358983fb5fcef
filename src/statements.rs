//! Splits a raw SQL corpus into individual statements.
//!
//! Splitting is purely textual on `;`. A terminator inside a quoted literal or a comment
//! splits the statement there as well.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Character that separates statements in a corpus file.
pub const STATEMENT_TERMINATOR: char = ';';

/// Splits `source` on [`STATEMENT_TERMINATOR`], trimming each piece and dropping empty ones.
pub fn split_statements(source: &str) -> Vec<String> {
    source
        .split(STATEMENT_TERMINATOR)
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a corpus file and splits it into statements.
pub fn load_statements(path: &Path) -> Result<Vec<String>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read SQL corpus {:?}", path))?;
    Ok(split_statements(&source))
}
