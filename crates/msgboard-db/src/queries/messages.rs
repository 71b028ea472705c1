//! Message-related database queries.

use crate::pool::{DbError, DbResult};
use rusqlite::{params, Connection, Row};

/// Message row from database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub seq: i64,
    pub id: String,
    pub content: String,
    pub created_at: String,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            id: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

/// Insert a new message and return the stored row.
pub fn insert_message(
    conn: &Connection,
    id: &str,
    content: &str,
    created_at: &str,
) -> DbResult<MessageRow> {
    conn.execute(
        "INSERT INTO messages (id, content, created_at) VALUES (?1, ?2, ?3)",
        params![id, content, created_at],
    )?;

    Ok(MessageRow {
        seq: conn.last_insert_rowid(),
        id: id.to_string(),
        content: content.to_string(),
        created_at: created_at.to_string(),
    })
}

/// Get a message by ID.
pub fn get_message(conn: &Connection, id: &str) -> DbResult<MessageRow> {
    conn.query_row(
        "SELECT seq, id, content, created_at FROM messages WHERE id = ?1",
        params![id],
        MessageRow::from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("Message: {}", id)),
        e => DbError::Connection(e),
    })
}

/// List messages, newest first.
///
/// Insertion order decides recency, so messages sharing a timestamp still
/// come back in the order they were created.
pub fn list_messages(conn: &Connection, limit: Option<usize>) -> DbResult<Vec<MessageRow>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map(|n| n as i64).unwrap_or(-1);

    let mut stmt = conn.prepare(
        "SELECT seq, id, content, created_at
         FROM messages
         ORDER BY seq DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], MessageRow::from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
}

/// Count stored messages.
pub fn count_messages(conn: &Connection) -> DbResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    Ok(count)
}
