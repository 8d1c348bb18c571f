//! `SQLite` word corpus.
//!
//! One row per (word, translation, category) triple. A word with several
//! translations has several rows; lookups group them back together in
//! insertion order.

use std::io::Read;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::{Connection, params};
use serde::Deserialize;

use super::connection::{acquire_lock, open_connection, open_in_memory};
use super::metrics::{record_operation_metrics, status_of};
use crate::models::{CorpusItem, Translation};
use crate::storage::traits::{CorpusBackend, CorpusQuery};
use crate::{Error, Result};

/// SQLite-backed word corpus.
pub struct SqliteCorpus {
    conn: Mutex<Connection>,
}

/// One record of a corpus CSV file.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    word: String,
    translation: String,
    #[serde(default)]
    category: String,
}

impl SqliteCorpus {
    /// Opens (or creates) a corpus database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(open_connection(path.as_ref())?)
    }

    /// Creates an in-memory corpus (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let corpus = Self {
            conn: Mutex::new(conn),
        };
        corpus.initialize_schema()?;
        Ok(corpus)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS corpus_words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                translation TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_corpus_words_word ON corpus_words(word);
            ",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_corpus_schema".to_string(),
            cause: e.to_string(),
        })
    }

    /// Inserts corpus items in one transaction.
    ///
    /// Returns the number of translation rows written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a word is blank, or
    /// [`Error::OperationFailed`] if the write fails.
    pub fn insert_items(&self, items: &[CorpusItem]) -> Result<usize> {
        if let Some(blank) = items.iter().position(|item| item.key.trim().is_empty()) {
            return Err(Error::InvalidInput(format!(
                "corpus item {} has an empty word",
                blank + 1
            )));
        }

        let rows = items.iter().flat_map(|item| {
            item.translations
                .iter()
                .map(move |t| (item.key.trim(), t.text.as_str(), t.category.as_str()))
        });
        self.insert_raw(rows)
    }

    /// Imports a `word,translation,category` CSV with a header row.
    ///
    /// The `category` column may be omitted. Returns the number of rows
    /// imported. Nothing is written if any record is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed CSV or blank words, or
    /// [`Error::OperationFailed`] if the write fails.
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, result) in csv_reader.deserialize::<CsvRecord>().enumerate() {
            let record = result
                .map_err(|e| Error::InvalidInput(format!("corpus row {}: {e}", index + 1)))?;
            if record.word.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "corpus row {} has an empty word",
                    index + 1
                )));
            }
            records.push(record);
        }

        let imported = self.insert_raw(
            records
                .iter()
                .map(|r| (r.word.as_str(), r.translation.as_str(), r.category.as_str())),
        )?;
        tracing::info!(rows = imported, "Imported corpus CSV");
        Ok(imported)
    }

    fn insert_raw<'a>(
        &self,
        rows: impl Iterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Result<usize> {
        let start = Instant::now();
        let result = (|| -> Result<usize> {
            let mut conn = acquire_lock(&self.conn);
            let tx = conn.transaction().map_err(|e| Error::OperationFailed {
                operation: "begin_corpus_insert".to_string(),
                cause: e.to_string(),
            })?;

            let mut written = 0;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT INTO corpus_words (word, translation, category) VALUES (?1, ?2, ?3)",
                    )
                    .map_err(|e| Error::OperationFailed {
                        operation: "prepare_corpus_insert".to_string(),
                        cause: e.to_string(),
                    })?;
                for (word, translation, category) in rows {
                    stmt.execute(params![word, translation, category])
                        .map_err(|e| Error::OperationFailed {
                            operation: "insert_corpus_word".to_string(),
                            cause: e.to_string(),
                        })?;
                    written += 1;
                }
            }

            tx.commit().map_err(|e| Error::OperationFailed {
                operation: "commit_corpus_insert".to_string(),
                cause: e.to_string(),
            })?;
            Ok(written)
        })();

        record_operation_metrics("corpus", "insert", start, status_of(&result));
        result
    }

    fn query_rows(&self, query: &CorpusQuery) -> Result<Vec<(String, String, String)>> {
        let conn = acquire_lock(&self.conn);
        let map_err = |e: rusqlite::Error| Error::OperationFailed {
            operation: "lookup_corpus".to_string(),
            cause: e.to_string(),
        };

        let mut rows = Vec::new();
        match query {
            CorpusQuery::All => {
                let mut stmt = conn
                    .prepare("SELECT word, translation, category FROM corpus_words ORDER BY id")
                    .map_err(map_err)?;
                let mapped = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                    .map_err(map_err)?;
                for row in mapped {
                    rows.push(row.map_err(map_err)?);
                }
            },
            CorpusQuery::Keys(keys) => {
                let mut stmt = conn
                    .prepare_cached(
                        "SELECT word, translation, category FROM corpus_words WHERE word = ?1 ORDER BY id",
                    )
                    .map_err(map_err)?;
                for key in keys {
                    let mapped = stmt
                        .query_map(params![key], |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                        })
                        .map_err(map_err)?;
                    for row in mapped {
                        rows.push(row.map_err(map_err)?);
                    }
                }
            },
        }
        Ok(rows)
    }
}

/// Groups flat rows into corpus items, keeping first-appearance order.
fn group_rows(rows: Vec<(String, String, String)>) -> Vec<CorpusItem> {
    let mut items: Vec<CorpusItem> = Vec::new();
    let mut positions: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for (word, translation, category) in rows {
        let translation = Translation::new(translation, category);
        if let Some(&idx) = positions.get(&word) {
            items[idx].translations.push(translation);
        } else {
            positions.insert(word.clone(), items.len());
            items.push(CorpusItem::new(word, vec![translation]));
        }
    }
    items
}

impl CorpusBackend for SqliteCorpus {
    fn lookup(&self, query: &CorpusQuery) -> Result<Vec<CorpusItem>> {
        let start = Instant::now();
        let result = self.query_rows(query).map(group_rows);
        record_operation_metrics("corpus", "lookup", start, status_of(&result));
        result
    }

    fn keys(&self) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = (|| -> Result<Vec<String>> {
            let conn = acquire_lock(&self.conn);
            let map_err = |e: rusqlite::Error| Error::OperationFailed {
                operation: "list_corpus_keys".to_string(),
                cause: e.to_string(),
            };
            let mut stmt = conn
                .prepare("SELECT word FROM corpus_words GROUP BY word ORDER BY MIN(id)")
                .map_err(map_err)?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(map_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(keys)
        })();
        record_operation_metrics("corpus", "keys", start, status_of(&result));
        result
    }

    fn count(&self) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(DISTINCT word) FROM corpus_words", [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::OperationFailed {
                operation: "count_corpus_words".to_string(),
                cause: e.to_string(),
            })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteCorpus {
        let corpus = SqliteCorpus::in_memory().unwrap();
        corpus
            .insert_items(&[
                CorpusItem::new(
                    "run",
                    vec![Translation::new("跑, 奔跑", "v"), Translation::new("运行", "n")],
                ),
                CorpusItem::new("apple", vec![Translation::new("苹果", "n")]),
            ])
            .unwrap();
        corpus
            .insert_items(&[CorpusItem::new("run", vec![Translation::new("跑 ", "v")])])
            .unwrap();
        corpus
    }

    #[test]
    fn test_lookup_all_groups_translations() {
        let corpus = seeded();
        let items = corpus.lookup(&CorpusQuery::All).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, "run");
        assert_eq!(
            items[0].translations,
            vec![
                Translation::new("跑, 奔跑", "v"),
                Translation::new("运行", "n"),
                Translation::new("跑 ", "v"),
            ]
        );
        assert_eq!(items[1].key, "apple");
    }

    #[test]
    fn test_lookup_keys_skips_unknown() {
        let corpus = seeded();
        let items = corpus
            .lookup(&CorpusQuery::Keys(vec![
                "apple".to_string(),
                "pear".to_string(),
            ]))
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "apple");
    }

    #[test]
    fn test_keys_and_count() {
        let corpus = seeded();
        assert_eq!(corpus.keys().unwrap(), vec!["run", "apple"]);
        assert_eq!(corpus.count().unwrap(), 2);
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        assert!(corpus.lookup(&CorpusQuery::All).unwrap().is_empty());
        assert!(corpus.keys().unwrap().is_empty());
        assert_eq!(corpus.count().unwrap(), 0);
    }

    #[test]
    fn test_import_csv() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        let csv = "word,translation,category\nrun,\"跑, 奔跑\",v\napple, 苹果 ,n\nrun,运行,n\n";

        assert_eq!(corpus.import_csv(csv.as_bytes()).unwrap(), 3);
        let items = corpus.lookup(&CorpusQuery::All).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].translations[0], Translation::new("跑, 奔跑", "v"));
        assert_eq!(items[1].translations[0], Translation::new("苹果", "n"));
    }

    #[test]
    fn test_import_csv_without_category_column() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        let csv = "word,translation\nrain,雨\n";
        assert_eq!(corpus.import_csv(csv.as_bytes()).unwrap(), 1);
        let items = corpus.lookup(&CorpusQuery::All).unwrap();
        assert_eq!(items[0].translations[0], Translation::new("雨", ""));
    }

    #[test]
    fn test_import_csv_rejects_blank_word() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        let csv = "word,translation,category\nrun,跑,v\n,空,n\n";

        let err = corpus.import_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(corpus.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_items_rejects_blank_word() {
        let corpus = SqliteCorpus::in_memory().unwrap();
        let err = corpus
            .insert_items(&[CorpusItem::new("  ", vec![Translation::new("x", "n")])])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
