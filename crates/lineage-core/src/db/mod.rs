//! Store database utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer runs
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` for relational integrity

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store database, apply runtime pragmas, and
/// migrate the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open store database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open an in-memory store with the schema applied. Intended for tests
/// and scratch computations; skips file-oriented pragmas.
///
/// # Errors
///
/// Returns an error if opening or migrating fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
