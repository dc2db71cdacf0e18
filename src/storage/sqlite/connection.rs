//! Connection handling for the `SQLite` engine.
//!
//! Lock acquisition with poison recovery, connection opening and pragma
//! configuration.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Acquires a mutex, recovering the inner value if it was poisoned.
///
/// A panic inside a critical section leaves the connections themselves
/// usable, so a poisoned lock is logged and taken over instead of failing
/// every later call.
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

/// Opens (creating if needed) a database file and configures it.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the parent directory cannot be
/// created or the file cannot be opened.
pub fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::operation("create_workspace_dir", e))?;
        }
    }
    let conn = Connection::open(path).map_err(|e| {
        Error::operation("open_sqlite", format!("{}: {e}", path.display()))
    })?;
    configure_connection(&conn);
    Ok(conn)
}

/// Opens an in-memory database.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if `SQLite` cannot allocate it.
pub fn open_memory() -> Result<Connection> {
    let conn =
        Connection::open_in_memory().map_err(|e| Error::operation("open_sqlite_memory", e))?;
    configure_connection(&conn);
    Ok(conn)
}

/// Applies WAL journaling, NORMAL synchronous mode and the busy timeout.
///
/// Pragma results are ignored: in-memory databases stay in `memory`
/// journal mode.
pub fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    });
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS);
    let _ = conn.pragma_update(None, "foreign_keys", "ON");
}
