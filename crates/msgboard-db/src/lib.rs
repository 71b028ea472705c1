//! Message board persistence layer.
//!
//! A single SQLite database holds the `messages` table. The pool hands out
//! the connection behind an async mutex; writes that must be undone when a
//! later step fails go through [`WriteTxn`].

pub mod migrations;
pub mod pool;
pub mod queries;

pub use pool::{DbError, DbPool, DbResult, WriteTxn};

use std::path::Path;

/// Open (or create) the database at `path` and bring its schema up to date.
pub fn init_pool(path: &Path) -> DbResult<DbPool> {
    let pool = DbPool::open(path)?;
    tracing::debug!(path = %path.display(), "Database opened");
    Ok(pool)
}
