//! Shared connection handling for `SQLite` backends.
//!
//! Each backend owns one `Mutex<Connection>`. Several processes may open the
//! same database file; WAL mode and a busy timeout keep their reads and
//! writes from failing on lock contention.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Acquires a mutex lock with poison recovery.
///
/// If a previous holder panicked, the inner value is recovered and a
/// warning is logged instead of propagating the poison.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a connection for concurrent multi-process use.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: durable enough for regenerable data
/// - **`busy_timeout`**: wait for locks instead of failing with `SQLITE_BUSY`
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the busy timeout cannot be set.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal", or "memory" for in-memory databases),
    // so pragma_update's result is ignored for the mode switches.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)
        .map_err(|e| Error::OperationFailed {
            operation: "configure_connection".to_string(),
            cause: e.to_string(),
        })
}

/// Opens and configures a database file, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory or database cannot be
/// created or opened.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_database_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_database".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Opens an in-memory database.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the database cannot be created.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
        operation: "open_database_memory".to_string(),
        cause: e.to_string(),
    })?;
    configure_connection(&conn)?;
    Ok(conn)
}
