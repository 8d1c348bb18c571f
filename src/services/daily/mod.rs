//! Deterministic daily word selection.
//!
//! Every caller asking for the same date gets the same words. The first
//! request for a date ranks the corpus with a seed derived from the date,
//! persists the chosen words, and later requests read them back.
//!
//! # Concurrency
//!
//! There is no lock around the read-then-write on an empty date. Two
//! processes racing on the same date compute the same ranking and may both
//! insert rows; assembly deduplicates by key, so both converge on the same
//! selection.

mod assembly;
mod ranking;

use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::config::DailyConfig;
use crate::models::{CalendarDate, DailySelection, DayBoundary, SelectionRow};
use crate::services::cache::{NoCache, SelectionCache};
use crate::storage::{CorpusBackend, CorpusQuery, SelectionStore};
use crate::{Error, Result};

pub use assembly::{
    SENSE_DELIMITERS, assemble, dedup_translations, distinct_keys, normalize_translation,
    short_form,
};
pub use ranking::{rank_score, select_keys};

/// Default number of words in a daily selection.
pub const DEFAULT_WORD_COUNT: usize = 12;

/// Service producing date-stable daily word selections.
pub struct DailyWordService {
    corpus: Arc<dyn CorpusBackend>,
    store: Arc<dyn SelectionStore>,
    cache: Arc<dyn SelectionCache>,
    word_count: usize,
    day_boundary: DayBoundary,
}

impl DailyWordService {
    /// Creates a service without caching.
    #[must_use]
    pub fn new(corpus: Arc<dyn CorpusBackend>, store: Arc<dyn SelectionStore>) -> Self {
        Self {
            corpus,
            store,
            cache: Arc::new(NoCache),
            word_count: DEFAULT_WORD_COUNT,
            day_boundary: DayBoundary::default(),
        }
    }

    /// Sets the selection cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn SelectionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the number of words per day.
    #[must_use]
    pub const fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    /// Sets which clock decides the current day.
    #[must_use]
    pub const fn with_day_boundary(mut self, day_boundary: DayBoundary) -> Self {
        self.day_boundary = day_boundary;
        self
    }

    /// Applies word count and day boundary from configuration.
    #[must_use]
    pub fn with_config(self, config: &DailyConfig) -> Self {
        self.with_word_count(config.word_count)
            .with_day_boundary(config.day_boundary)
    }

    /// Returns the configured number of words per day.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.word_count
    }

    /// Returns today's date on the configured day boundary.
    #[must_use]
    pub fn today_date(&self) -> CalendarDate {
        self.day_boundary.today()
    }

    /// Returns the selection for today.
    ///
    /// # Errors
    ///
    /// See [`DailyWordService::selection_for`].
    pub fn today(&self) -> Result<DailySelection> {
        self.selection_for(self.today_date())
    }

    /// Returns the selection for `date`, creating and persisting it on first
    /// access.
    ///
    /// A corpus with no words yields an empty selection, which is neither
    /// persisted nor cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the corpus or the selection
    /// store cannot be read, or the new selection cannot be persisted.
    /// Nothing is cached when an error is returned.
    #[instrument(skip_all, fields(date = %date, word_count = self.word_count))]
    pub fn selection_for(&self, date: CalendarDate) -> Result<DailySelection> {
        if let Some(cached) = self.cache.get(&date) {
            tracing::debug!("Daily selection served from cache");
            metrics::counter!("daily_selection_cache_hits_total").increment(1);
            return Ok(cached);
        }

        let start = Instant::now();
        let result = self.load_or_generate(date);
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::histogram!("daily_selection_duration_ms", "status" => status)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        let selection = result.inspect_err(|e| {
            tracing::warn!(error = %e, "Daily selection failed");
        })?;
        if !selection.is_empty() {
            self.cache.put(&selection);
        }
        Ok(selection)
    }

    fn load_or_generate(&self, date: CalendarDate) -> Result<DailySelection> {
        let stored = self.store.find_by_date(&date).map_err(|e| wrap("find_by_date", e))?;
        let rows = if stored.is_empty() {
            self.generate(date)?
        } else {
            tracing::debug!(rows = stored.len(), "Using persisted daily selection");
            stored
        };
        if rows.is_empty() {
            return Ok(DailySelection::empty(date));
        }

        let keys = distinct_keys(&rows);
        let corpus = self
            .corpus
            .lookup(&CorpusQuery::Keys(keys))
            .map_err(|e| wrap("lookup_corpus", e))?;
        Ok(assemble(date, &rows, &corpus))
    }

    /// Ranks the corpus for `date`, persists the chosen words and returns
    /// the persisted rows.
    fn generate(&self, date: CalendarDate) -> Result<Vec<SelectionRow>> {
        let keys = self.corpus.keys().map_err(|e| wrap("list_corpus_keys", e))?;
        if keys.is_empty() {
            tracing::warn!("Corpus is empty, no daily selection generated");
            return Ok(Vec::new());
        }

        let chosen = select_keys(date.seed(), &keys, self.word_count);
        let items = self
            .corpus
            .lookup(&CorpusQuery::Keys(chosen.clone()))
            .map_err(|e| wrap("lookup_corpus", e))?;

        let rows: Vec<SelectionRow> = chosen
            .iter()
            .map(|key| {
                let first = items
                    .iter()
                    .find(|item| &item.key == key)
                    .and_then(|item| item.translations.first());
                SelectionRow {
                    key: key.clone(),
                    translation: first.map(|t| t.text.clone()).unwrap_or_default(),
                    category: first.map(|t| t.category.clone()).unwrap_or_default(),
                    date,
                }
            })
            .collect();

        self.store
            .insert_rows(&rows)
            .map_err(|e| wrap("insert_rows", e))?;

        tracing::info!(
            words = rows.len(),
            corpus_size = keys.len(),
            "Generated daily selection"
        );
        metrics::counter!("daily_selection_generated_total").increment(1);
        Ok(rows)
    }
}

/// Maps a backend error to an `OperationFailed` naming the sampler step.
fn wrap(operation: &str, error: Error) -> Error {
    match error {
        Error::OperationFailed { .. } => error,
        Error::InvalidInput(cause) => Error::OperationFailed {
            operation: operation.to_string(),
            cause,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CorpusItem, Translation};
    use crate::services::cache::DayCache;
    use crate::storage::{InMemoryCorpus, InMemorySelectionStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn corpus(words: usize) -> Arc<InMemoryCorpus> {
        Arc::new(InMemoryCorpus::with_items(
            (0..words)
                .map(|i| {
                    CorpusItem::new(
                        format!("word{i:03}"),
                        vec![Translation::new(format!("词{i}, 词语{i}"), "n")],
                    )
                })
                .collect(),
        ))
    }

    fn date() -> CalendarDate {
        CalendarDate::from_ymd(2026, 10, 16).unwrap()
    }

    /// Store whose reads or writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemorySelectionStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl SelectionStore for FlakyStore {
        fn find_by_date(&self, date: &CalendarDate) -> Result<Vec<SelectionRow>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::OperationFailed {
                    operation: "find_by_date".to_string(),
                    cause: "store offline".to_string(),
                });
            }
            self.inner.find_by_date(date)
        }

        fn insert_rows(&self, rows: &[SelectionRow]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::OperationFailed {
                    operation: "insert_rows".to_string(),
                    cause: "disk full".to_string(),
                });
            }
            self.inner.insert_rows(rows)
        }
    }

    #[test]
    fn test_selects_configured_count() {
        let store = Arc::new(InMemorySelectionStore::new());
        let service = DailyWordService::new(corpus(40), store.clone());

        let selection = service.selection_for(date()).unwrap();
        assert_eq!(selection.len(), DEFAULT_WORD_COUNT);
        assert_eq!(store.row_count(), DEFAULT_WORD_COUNT);

        let service = service.with_word_count(5);
        let other = service.selection_for(date().next_day().unwrap()).unwrap();
        assert_eq!(other.len(), 5);
    }

    #[test]
    fn test_small_corpus_returns_all_words() {
        let service =
            DailyWordService::new(corpus(3), Arc::new(InMemorySelectionStore::new()));
        assert_eq!(service.selection_for(date()).unwrap().len(), 3);
    }

    #[test]
    fn test_second_read_uses_persisted_rows() {
        let store = Arc::new(InMemorySelectionStore::new());
        let service = DailyWordService::new(corpus(30), store.clone());

        let first = service.selection_for(date()).unwrap();
        let second = service.selection_for(date()).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.row_count(), DEFAULT_WORD_COUNT);
    }

    #[test]
    fn test_independent_services_agree() {
        let shared_corpus = corpus(50);
        let a = DailyWordService::new(shared_corpus.clone(), Arc::new(InMemorySelectionStore::new()));
        let b = DailyWordService::new(shared_corpus, Arc::new(InMemorySelectionStore::new()));
        assert_eq!(
            a.selection_for(date()).unwrap(),
            b.selection_for(date()).unwrap()
        );
    }

    #[test]
    fn test_duplicate_rows_collapse_on_read() {
        let shared_corpus = corpus(20);
        let store = Arc::new(InMemorySelectionStore::new());
        let a = DailyWordService::new(shared_corpus.clone(), store.clone());
        let b = DailyWordService::new(shared_corpus, store.clone());

        let first = a.selection_for(date()).unwrap();
        // Simulate the losing side of a race appending the same rows again.
        let rows = store.find_by_date(&date()).unwrap();
        store.insert_rows(&rows).unwrap();

        assert_eq!(b.selection_for(date()).unwrap(), first);
        assert_eq!(store.row_count(), 2 * DEFAULT_WORD_COUNT);
    }

    #[test]
    fn test_dates_are_independent() {
        let store = Arc::new(InMemorySelectionStore::new());
        let service = DailyWordService::new(corpus(200), store);
        let today = service.selection_for(date()).unwrap();
        let tomorrow = service.selection_for(date().next_day().unwrap()).unwrap();

        assert_eq!(today.date, date());
        assert_eq!(tomorrow.date, date().next_day().unwrap());
        assert_ne!(today.keys(), tomorrow.keys());
    }

    #[test]
    fn test_empty_corpus_is_not_persisted_or_cached() {
        let store = Arc::new(InMemorySelectionStore::new());
        let cache = Arc::new(DayCache::new());
        let service = DailyWordService::new(Arc::new(InMemoryCorpus::new()), store.clone())
            .with_cache(cache.clone());

        let selection = service.selection_for(date()).unwrap();
        assert!(selection.is_empty());
        assert_eq!(store.row_count(), 0);
        assert!(cache.cached_date().is_none());
    }

    #[test]
    fn test_cache_serves_repeat_requests() {
        let store = Arc::new(FlakyStore::default());
        let cache = Arc::new(DayCache::new());
        let service = DailyWordService::new(corpus(30), store.clone()).with_cache(cache);

        let first = service.selection_for(date()).unwrap();
        store.fail_reads.store(true, Ordering::SeqCst);
        assert_eq!(service.selection_for(date()).unwrap(), first);

        // A new date misses the cache and reaches the failing store.
        assert!(service.selection_for(date().next_day().unwrap()).is_err());
    }

    #[test]
    fn test_store_read_failure_is_propagated() {
        let store = Arc::new(FlakyStore::default());
        store.fail_reads.store(true, Ordering::SeqCst);
        let cache = Arc::new(DayCache::new());
        let service = DailyWordService::new(corpus(30), store).with_cache(cache.clone());

        let err = service.selection_for(date()).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
        assert!(cache.cached_date().is_none());
    }

    #[test]
    fn test_store_write_failure_is_not_cached() {
        let store = Arc::new(FlakyStore::default());
        store.fail_writes.store(true, Ordering::SeqCst);
        let cache = Arc::new(DayCache::new());
        let service =
            DailyWordService::new(corpus(30), store.clone()).with_cache(cache.clone());

        assert!(service.selection_for(date()).is_err());
        assert!(cache.cached_date().is_none());

        store.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(service.selection_for(date()).unwrap().len(), DEFAULT_WORD_COUNT);
        assert_eq!(cache.cached_date(), Some(date()));
    }

    #[test]
    fn test_translation_dedup_in_selection() {
        let corpus = Arc::new(InMemoryCorpus::with_items(vec![CorpusItem::new(
            "run",
            vec![Translation::new("跑, 奔跑", "v"), Translation::new("跑 ", "v")],
        )]));
        let service = DailyWordService::new(corpus, Arc::new(InMemorySelectionStore::new()));

        let selection = service.selection_for(date()).unwrap();
        let run = selection.get("run").unwrap();
        assert_eq!(run.translations.len(), 1);
        assert_eq!(run.translations[0].text, "跑");
        assert_eq!(run.translations[0].category, "v");
    }

    #[test]
    fn test_with_config() {
        let config = DailyConfig {
            word_count: 4,
            day_boundary: DayBoundary::Local,
        };
        let service =
            DailyWordService::new(corpus(10), Arc::new(InMemorySelectionStore::new()))
                .with_config(&config);
        assert_eq!(service.word_count(), 4);
        assert_eq!(service.today().unwrap().len(), 4);
    }
}
