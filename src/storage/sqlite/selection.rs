//! `SQLite` store for persisted daily selections.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::{Connection, params};

use super::connection::{acquire_lock, open_connection, open_in_memory};
use super::metrics::{record_operation_metrics, status_of};
use crate::models::{CalendarDate, SelectionRow};
use crate::storage::traits::SelectionStore;
use crate::{Error, Result, current_timestamp};

/// SQLite-backed daily selection store.
///
/// The `daily_words` table has no uniqueness constraint on `(date, word)`:
/// two processes generating the same date concurrently both append, and the
/// daily service collapses duplicates on read.
pub struct SqliteSelectionStore {
    conn: Mutex<Connection>,
}

impl SqliteSelectionStore {
    /// Opens (or creates) a selection database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(open_connection(path.as_ref())?)
    }

    /// Creates an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS daily_words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                word TEXT NOT NULL,
                translation TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_daily_words_date ON daily_words(date);
            ",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_selection_schema".to_string(),
            cause: e.to_string(),
        })
    }

    /// Lists the dates that have at least one stored row, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn dates(&self) -> Result<Vec<CalendarDate>> {
        let conn = acquire_lock(&self.conn);
        let map_err = |e: rusqlite::Error| Error::OperationFailed {
            operation: "list_selection_dates".to_string(),
            cause: e.to_string(),
        };

        let mut stmt = conn
            .prepare("SELECT DISTINCT date FROM daily_words ORDER BY date DESC")
            .map_err(map_err)?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(map_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_err)?;

        raw.iter().map(|s| CalendarDate::parse(s)).collect()
    }
}

impl SelectionStore for SqliteSelectionStore {
    fn find_by_date(&self, date: &CalendarDate) -> Result<Vec<SelectionRow>> {
        let start = Instant::now();
        let result = (|| -> Result<Vec<SelectionRow>> {
            let conn = acquire_lock(&self.conn);
            let map_err = |e: rusqlite::Error| Error::OperationFailed {
                operation: "find_by_date".to_string(),
                cause: e.to_string(),
            };

            let mut stmt = conn
                .prepare_cached(
                    "SELECT word, translation, category FROM daily_words WHERE date = ?1 ORDER BY id",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![date.iso()], |row| {
                    Ok(SelectionRow {
                        key: row.get(0)?,
                        translation: row.get(1)?,
                        category: row.get(2)?,
                        date: *date,
                    })
                })
                .map_err(map_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(rows)
        })();

        record_operation_metrics("selection", "find_by_date", start, status_of(&result));
        result
    }

    fn insert_rows(&self, rows: &[SelectionRow]) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<()> {
            let mut conn = acquire_lock(&self.conn);
            let map_err = |e: rusqlite::Error| Error::OperationFailed {
                operation: "insert_rows".to_string(),
                cause: e.to_string(),
            };

            let created_at = i64::try_from(current_timestamp()).unwrap_or(i64::MAX);
            let tx = conn.transaction().map_err(map_err)?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT INTO daily_words (date, word, translation, category, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(map_err)?;
                for row in rows {
                    stmt.execute(params![
                        row.date.iso(),
                        row.key,
                        row.translation,
                        row.category,
                        created_at
                    ])
                    .map_err(map_err)?;
                }
            }
            tx.commit().map_err(map_err)
        })();

        record_operation_metrics("selection", "insert_rows", start, status_of(&result));
        result
    }
}
