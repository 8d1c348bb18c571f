//! CLI command for importing a corpus CSV.

use crate::config::WordwiseConfig;
use crate::storage::CorpusBackend;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Executes the import command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, holds invalid rows, or the
/// database write fails.
pub fn cmd_import(config: &WordwiseConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| crate::Error::OperationFailed {
        operation: "open_corpus_csv".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    let (corpus, _store) = super::open_stores(config)?;
    let rows = corpus.import_csv(BufReader::new(file))?;
    let words = corpus.count()?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Imported {rows} translations from {} ({words} words in corpus)",
        path.display()
    )?;
    Ok(())
}
