//! Storage backend traits.

mod corpus;
mod selection;

pub use corpus::{CorpusBackend, CorpusQuery};
pub use selection::SelectionStore;
