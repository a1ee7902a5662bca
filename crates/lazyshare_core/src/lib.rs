//! Shared-resource access primitives for LazyShare.
//! Lazily constructed process-wide instances and read-through caching over
//! authoritative data sources.

pub mod cache;
pub mod config;
pub mod logging;
pub mod singleton;
pub mod store;

pub use cache::{origin_fn, CacheStats, CachingProxy, FillPolicy, FnOrigin, Origin};
pub use config::{CacheConfig, ConfigError, CoreConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use singleton::{SingletonHolder, SingletonState};
pub use store::{open_store, open_store_in_memory, SqliteRecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
