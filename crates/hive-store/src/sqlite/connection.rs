//! Connection pooling for the `SQLite` store.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;
use crate::sqlite::migrations::run_migrations;

/// Pool of `SQLite` connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// One checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

fn configure(conn: &mut Connection) -> rusqlite::Result<()> {
    // journal_mode returns the resulting mode as a row, so run it as a query
    conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;
    Ok(())
}

/// Open a pooled store at `path`, running migrations.
pub fn open(path: &Path) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(configure);
    let pool = r2d2::Pool::builder().max_size(8).build(manager)?;
    run_migrations(&*pool.get()?)?;
    Ok(pool)
}

/// Open an in-memory store, running migrations.
///
/// The pool is capped at a single connection: each `SQLite` `:memory:`
/// connection is its own database, so a wider pool would see empty tables.
pub fn new_in_memory() -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::memory().with_init(configure);
    let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
    run_migrations(&*pool.get()?)?;
    Ok(pool)
}
