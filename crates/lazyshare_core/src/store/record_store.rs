//! Key/value record store over one SQLite connection.
//!
//! # Responsibility
//! - Upsert and read string records by key.
//! - Serve as an `Origin` for caching proxies.
//!
//! # Invariants
//! - Keys must be non-blank.
//! - The connection is only touched while holding its mutex.

use super::{StoreError, StoreResult};
use crate::cache::Origin;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// SQLite-backed record store shared across threads.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub(super) fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Inserts or replaces the record stored under `key`.
    ///
    /// # Errors
    /// - Returns `InvalidData` when `key` is blank.
    /// - Returns `Sqlite` when the write fails.
    pub fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.conn().execute(
            "INSERT INTO records (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }

    /// Reads one record, returning `None` when the key is absent.
    pub fn get_record(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM records WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Returns the number of stored records.
    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM records;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative record count `{count}`")))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Origin for SqliteRecordStore {
    type Key = String;
    type Value = String;
    type Error = StoreError;

    fn fetch(&self, key: &String) -> StoreResult<String> {
        let started_at = Instant::now();
        match self.get_record(key) {
            Ok(Some(value)) => {
                info!(
                    "event=store_fetch module=store status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Ok(None) => {
                warn!(
                    "event=store_fetch module=store status=not_found duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Err(StoreError::NotFound(key.clone()))
            }
            Err(err) => {
                warn!(
                    "event=store_fetch module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidData("record key cannot be blank".to_string()));
    }
    Ok(())
}
