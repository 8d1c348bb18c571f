//! In-memory storage backends for testing.
//!
//! Provides non-persistent implementations of [`CorpusBackend`] and
//! [`SelectionStore`] for unit tests and embedding.

use std::sync::RwLock;

use crate::models::{CalendarDate, CorpusItem, SelectionRow};
use crate::storage::traits::{CorpusBackend, CorpusQuery, SelectionStore};
use crate::{Error, Result};

/// In-memory word corpus.
///
/// Items keep the order in which they were added. Adding a word that is
/// already present appends its translations to the existing item.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    items: RwLock<Vec<CorpusItem>>,
}

impl InMemoryCorpus {
    /// Creates an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a corpus holding the given items.
    #[must_use]
    pub fn with_items(items: Vec<CorpusItem>) -> Self {
        let corpus = Self::new();
        corpus.extend(items);
        corpus
    }

    /// Adds items, merging translations of words already present.
    pub fn extend(&self, items: impl IntoIterator<Item = CorpusItem>) {
        let mut stored = match self.items.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for item in items {
            if let Some(existing) = stored.iter_mut().find(|i| i.key == item.key) {
                existing.translations.extend(item.translations);
            } else {
                stored.push(item);
            }
        }
    }
}

impl CorpusBackend for InMemoryCorpus {
    fn lookup(&self, query: &CorpusQuery) -> Result<Vec<CorpusItem>> {
        let items = self.items.read().map_err(|_| Error::OperationFailed {
            operation: "lookup_corpus".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;

        Ok(match query {
            CorpusQuery::All => items.clone(),
            CorpusQuery::Keys(keys) => keys
                .iter()
                .filter_map(|key| items.iter().find(|item| &item.key == key).cloned())
                .collect(),
        })
    }
}

/// In-memory daily selection store.
#[derive(Debug, Default)]
pub struct InMemorySelectionStore {
    rows: RwLock<Vec<SelectionRow>>,
}

impl InMemorySelectionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored rows across all dates.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl SelectionStore for InMemorySelectionStore {
    fn find_by_date(&self, date: &CalendarDate) -> Result<Vec<SelectionRow>> {
        let rows = self.rows.read().map_err(|_| Error::OperationFailed {
            operation: "find_by_date".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        Ok(rows.iter().filter(|r| r.date == *date).cloned().collect())
    }

    fn insert_rows(&self, new_rows: &[SelectionRow]) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| Error::OperationFailed {
            operation: "insert_rows".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        rows.extend_from_slice(new_rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Translation;

    #[test]
    fn test_corpus_merges_duplicate_words() {
        let corpus = InMemoryCorpus::with_items(vec![
            CorpusItem::new("run", vec![Translation::new("跑", "v")]),
            CorpusItem::new("apple", vec![Translation::new("苹果", "n")]),
            CorpusItem::new("run", vec![Translation::new("运行", "n")]),
        ]);

        assert_eq!(corpus.keys().unwrap(), vec!["run", "apple"]);
        let run = corpus
            .lookup(&CorpusQuery::Keys(vec!["run".to_string()]))
            .unwrap();
        assert_eq!(run[0].translations.len(), 2);
    }

    #[test]
    fn test_corpus_lookup_keys_follows_query_order() {
        let corpus = InMemoryCorpus::with_items(vec![
            CorpusItem::new("a", vec![]),
            CorpusItem::new("b", vec![]),
        ]);
        let found = corpus
            .lookup(&CorpusQuery::Keys(vec![
                "b".to_string(),
                "missing".to_string(),
                "a".to_string(),
            ]))
            .unwrap();
        let keys: Vec<_> = found.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(corpus.count().unwrap(), 2);
    }

    #[test]
    fn test_selection_store_filters_by_date() {
        let store = InMemorySelectionStore::new();
        let today = CalendarDate::from_ymd(2026, 10, 16).unwrap();
        let tomorrow = today.next_day().unwrap();
        let row = |key: &str, date| SelectionRow {
            key: key.to_string(),
            translation: String::new(),
            category: String::new(),
            date,
        };

        store
            .insert_rows(&[row("apple", today), row("pear", tomorrow)])
            .unwrap();
        store.insert_rows(&[row("apple", today)]).unwrap();

        assert_eq!(store.find_by_date(&today).unwrap().len(), 2);
        assert_eq!(store.find_by_date(&tomorrow).unwrap()[0].key, "pear");
        assert_eq!(store.row_count(), 3);
    }
}
