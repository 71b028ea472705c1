//! Database migrations.

use crate::pool::{DbError, DbResult};
use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

/// SQL schema definition.
const SCHEMA: &str = include_str!("schema.sql");

/// Run all database migrations.
pub fn run_migrations(conn: &mut Connection) -> DbResult<()> {
    let migrations = Migrations::new(vec![M::up(SCHEMA)]);

    migrations
        .to_latest(conn)
        .map_err(|e| DbError::Migration(e.to_string()))
}
