//! SQLite connection pool.

use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::migrations::run_migrations;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Distinguishes in-memory databases opened by the same process.
static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Shared handle to the board database.
///
/// Writes and reads use separate connections. The writer is held for the
/// whole of a [`WriteTxn`], which can span an await; the reader is only
/// held for one synchronous query, so listings never queue behind an open
/// write. Clone it freely; all clones share both connections.
#[derive(Clone)]
pub struct DbPool {
    writer: Arc<Mutex<Connection>>,
    reader: Arc<Mutex<Connection>>,
}

impl DbPool {
    /// Open a file-backed database, creating parent directories as needed.
    ///
    /// WAL mode lets the reader see the last committed state while the
    /// writer has a transaction open.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = Connection::open(path)?;
        writer.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        writer.busy_timeout(BUSY_TIMEOUT)?;
        run_migrations(&mut writer)?;

        let reader = Connection::open(path)?;
        Self::from_connections(writer, reader)
    }

    /// Open a migrated in-memory database.
    ///
    /// Both connections share one cache. Unlike a file database, a read that
    /// touches a table with an uncommitted write fails with `SQLITE_LOCKED`
    /// instead of reading the previous state, so this is meant for tests.
    pub fn in_memory() -> DbResult<Self> {
        let uri = format!(
            "file:msgboard-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let mut writer = Connection::open_with_flags(&uri, flags)?;
        writer.busy_timeout(BUSY_TIMEOUT)?;
        run_migrations(&mut writer)?;

        let reader = Connection::open_with_flags(&uri, flags)?;
        Self::from_connections(writer, reader)
    }

    fn from_connections(writer: Connection, reader: Connection) -> DbResult<Self> {
        reader.busy_timeout(BUSY_TIMEOUT)?;
        reader.pragma_update(None, "query_only", true)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            reader: Arc::new(Mutex::new(reader)),
        })
    }

    /// Run `f` on the read connection.
    ///
    /// Sees committed data only and does not wait for open write
    /// transactions. Writes through this connection are rejected.
    pub async fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.reader.lock().await;
        f(&conn)
    }

    /// Start a write transaction.
    ///
    /// The write connection stays locked until the returned [`WriteTxn`] is
    /// committed, rolled back or dropped. Reads are unaffected.
    pub async fn begin(&self) -> DbResult<WriteTxn> {
        let conn = self.writer.clone().lock_owned().await;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(WriteTxn {
            conn,
            finished: false,
        })
    }
}

/// An open `BEGIN IMMEDIATE` transaction that owns the write connection.
///
/// Dropping it without calling [`WriteTxn::commit`] rolls the work back.
pub struct WriteTxn {
    conn: OwnedMutexGuard<Connection>,
    finished: bool,
}

impl WriteTxn {
    /// Make the transaction's writes durable.
    pub fn commit(mut self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    /// Discard the transaction's writes.
    pub fn rollback(mut self) -> DbResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Deref for WriteTxn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for WriteTxn {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "Rollback of abandoned transaction failed");
            }
        }
    }
}
