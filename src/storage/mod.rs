//! Storage layer.
//!
//! Two stores back the daily sampler:
//! - **Corpus**: read-only words and their translations ([`CorpusBackend`])
//! - **Selections**: persisted daily word sets ([`SelectionStore`])
//!
//! Both have a `SQLite` implementation for real use and an in-memory one for
//! tests and embedding.

// Dropping database guards slightly early provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::{InMemoryCorpus, InMemorySelectionStore};
pub use sqlite::{SqliteCorpus, SqliteSelectionStore};
pub use traits::{CorpusBackend, CorpusQuery, SelectionStore};
