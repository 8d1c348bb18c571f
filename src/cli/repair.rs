//! CLI command for repairing partial JSON.

use crate::llm::complete_json;
use std::io::{self, Read, Write};

/// Message printed when the input cannot be repaired yet.
pub const NOT_PARSEABLE: &str = "not yet parseable";

/// Repairs `text` and writes the result as pretty JSON.
///
/// Returns `true` if the text could be repaired.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_repair<W: Write>(
    writer: &mut W,
    text: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match complete_json(text) {
        Some(map) => {
            let json = serde_json::to_string_pretty(&map)?;
            writeln!(writer, "{json}")?;
            Ok(true)
        },
        None => {
            writeln!(writer, "{NOT_PARSEABLE}")?;
            Ok(false)
        },
    }
}

/// Executes the repair command, reading stdin when `text` is `None`.
///
/// An unparseable input is not an error; it prints [`NOT_PARSEABLE`].
///
/// # Errors
///
/// Returns an error if stdin cannot be read or output fails.
pub fn cmd_repair(text: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin().lock().read_to_string(&mut buffer)?;
            buffer
        },
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_repair(&mut handle, &text)?;
    Ok(())
}
