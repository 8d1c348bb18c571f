//! Corpus reader trait.

use crate::Result;
use crate::models::CorpusItem;

/// Which corpus entries to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusQuery {
    /// Every word in the corpus.
    All,
    /// Only the listed words; unknown words are skipped.
    Keys(Vec<String>),
}

/// Trait for read-only word corpora.
///
/// Implementations return one [`CorpusItem`] per distinct word, with its
/// translations in corpus order. The corpus is assumed stable for the
/// lifetime of a process.
pub trait CorpusBackend: Send + Sync {
    /// Looks up corpus items.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be read.
    fn lookup(&self, query: &CorpusQuery) -> Result<Vec<CorpusItem>>;

    /// Lists every distinct word.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be read.
    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .lookup(&CorpusQuery::All)?
            .into_iter()
            .map(|item| item.key)
            .collect())
    }

    /// Returns the number of distinct words.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be read.
    fn count(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }
}
