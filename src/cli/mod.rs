//! CLI command implementations.
//!
//! This module provides the command-line interface for wordwise. Each
//! submodule implements one command and writes its output to any
//! [`std::io::Write`], so commands can be tested against a buffer.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `daily` | Show the words of the day |
//! | `repair` | Repair a partial JSON object |
//! | `import` | Import a corpus CSV into the database |
//! | `story` | Stream a story chapter using given words |
//! | `associate` | Stream a memory association for a word |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! # Load a corpus, then show today's words
//! wordwise import words.csv
//! wordwise daily
//!
//! # Words for another date, as JSON
//! wordwise daily --date 2026-10-16 --format json
//!
//! # Continue a story with today's words
//! wordwise story --previous "The fox hid under the bridge."
//! ```

mod associate;
mod config;
mod daily;
mod import;
mod llm_factory;
mod repair;
mod story;

pub use associate::{cmd_associate, write_association};
pub use config::{cmd_config, write_config};
pub use daily::{OutputFormat, cmd_daily, write_selection_json, write_selection_text};
pub use import::cmd_import;
pub use llm_factory::{
    build_anthropic_client, build_http_config, build_llm_provider, build_openai_client,
};
pub use repair::{cmd_repair, write_repair};
pub use story::{ChapterPrinter, cmd_story};

use std::sync::Arc;

use crate::config::WordwiseConfig;
use crate::services::{DailyWordService, DayCache};
use crate::storage::{SqliteCorpus, SqliteSelectionStore};

/// Opens the corpus and selection store from the configured database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn open_stores(
    config: &WordwiseConfig,
) -> crate::Result<(Arc<SqliteCorpus>, Arc<SqliteSelectionStore>)> {
    let path = config.database_path();
    tracing::debug!(path = %path.display(), "Opening database");
    let corpus = Arc::new(SqliteCorpus::new(&path)?);
    let store = Arc::new(SqliteSelectionStore::new(&path)?);
    Ok((corpus, store))
}

/// Builds the daily word service from configuration.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn build_daily_service(config: &WordwiseConfig) -> crate::Result<DailyWordService> {
    let (corpus, store) = open_stores(config)?;
    Ok(DailyWordService::new(corpus, store)
        .with_cache(Arc::new(DayCache::new()))
        .with_config(&config.daily))
}
