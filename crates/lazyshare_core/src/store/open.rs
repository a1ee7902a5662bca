//! Connection bootstrap for the record store.
//!
//! # Invariants
//! - Returned stores have the `records` table in place.
//! - Every open attempt emits one `store_open` event with duration and status.

use super::record_store::SqliteRecordStore;
use super::StoreResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const RECORDS_SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);";

/// Opens a file-backed record store, creating the schema when missing.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<SqliteRecordStore> {
    bootstrap("file", || Connection::open(path))
}

/// Opens a private in-memory record store.
pub fn open_store_in_memory() -> StoreResult<SqliteRecordStore> {
    bootstrap("memory", Connection::open_in_memory)
}

fn bootstrap(
    mode: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StoreResult<SqliteRecordStore> {
    let started_at = Instant::now();
    info!("event=store_open module=store status=start mode={mode}");

    let conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = prepare_connection(&conn) {
        error!(
            "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_bootstrap_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=store_open module=store status=ok mode={mode} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(SqliteRecordStore::new(conn))
}

fn prepare_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(RECORDS_SCHEMA_SQL)
}
