//! SQLite-backed record store used as a cache origin.
//!
//! # Responsibility
//! - Open and bootstrap SQLite connections holding key/value records.
//! - Expose a plain synchronous fetch/store interface.
//!
//! # Invariants
//! - Returned stores have the `records` table created.
//! - Missing keys are reported as `StoreError::NotFound`, never as empty values.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod record_store;

pub use open::{open_store, open_store_in_memory};
pub use record_store::SqliteRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store error for bootstrap and query operations.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    NotFound(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
