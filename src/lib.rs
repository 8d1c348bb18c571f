//! # Wordwise
//!
//! Daily vocabulary sets and streamed LLM reading material for language learners.
//!
//! Wordwise selects a date-stable set of words from a translation corpus and
//! turns token-streamed LLM output into structured records while the stream
//! is still in flight.
//!
//! ## Features
//!
//! - Deterministic daily word sets, identical for every client on a given date
//! - At-least-once persistence of selections with read-side deduplication
//! - Best-effort repair of truncated JSON emitted by streaming LLMs
//! - Streamed story chapters and word associations (Anthropic, `OpenAI`)
//! - `SQLite` corpus and selection storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use wordwise::llm::complete_json;
//!
//! let partial = complete_json(r#"{"title": "The Red Fo"#);
//! assert_eq!(partial.unwrap()["title"], "The Red Fo");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{DailyConfig, DayBoundary, WordwiseConfig};
pub use llm::{LlmProvider, RepairedJson, complete_json};
pub use models::{
    CalendarDate, CorpusItem, DailyItem, DailySelection, SelectionRow, StoryChapter, Translation,
    TranslationEntry, WordAssociation,
};
pub use services::{DailyWordService, DayCache, SelectionCache, StoryService};
pub use storage::{CorpusBackend, CorpusQuery, SelectionStore};

/// Error type for wordwise operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed dates, blank corpus words, bad CLI arguments |
/// | `OperationFailed` | Database, filesystem, HTTP or LLM failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A calendar date is not in `YYYY-MM-DD` form
    /// - A corpus import row has an empty word
    /// - A configured value cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - Corpus or selection store is unavailable
    /// - An LLM request fails or its stream never yields a parseable record
    /// - Filesystem I/O errors occur
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for wordwise operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
