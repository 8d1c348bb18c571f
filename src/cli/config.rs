//! CLI command for showing the effective configuration.

use crate::config::WordwiseConfig;
use std::io::{self, Write};

/// Writes the effective configuration.
///
/// API keys are never written; only whether one is set.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_config<W: Write>(writer: &mut W, config: &WordwiseConfig) -> io::Result<()> {
    writeln!(writer, "Data directory: {}", config.data_dir.display())?;
    writeln!(writer, "Database: {}", config.database_path().display())?;
    writeln!(writer)?;

    writeln!(writer, "[daily]")?;
    writeln!(writer, "  word_count = {}", config.daily.word_count)?;
    writeln!(writer, "  day_boundary = {}", config.daily.day_boundary)?;
    writeln!(writer)?;

    let llm = &config.llm;
    writeln!(writer, "[llm]")?;
    writeln!(writer, "  provider = {}", llm.provider.as_str())?;
    writeln!(writer, "  model = {}", llm.model.as_deref().unwrap_or("(default)"))?;
    writeln!(writer, "  base_url = {}", llm.base_url.as_deref().unwrap_or("(default)"))?;
    let key_state = if llm.resolved_api_key().is_some() {
        "set"
    } else {
        "not set"
    };
    writeln!(writer, "  api_key = {key_state}")?;
    writeln!(writer)?;

    let logging = &config.logging;
    writeln!(writer, "[logging]")?;
    writeln!(writer, "  level = {}", logging.level.as_deref().unwrap_or("warn"))?;
    writeln!(writer, "  format = {}", logging.format.as_deref().unwrap_or("pretty"))?;
    match &logging.file {
        Some(file) => writeln!(writer, "  file = {}", file.display()),
        None => writeln!(writer, "  file = (stderr)"),
    }
}

/// Executes the config command.
///
/// # Errors
///
/// Returns an error if output fails.
pub fn cmd_config(config: &WordwiseConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_config(&mut handle, config)?;
    Ok(())
}
