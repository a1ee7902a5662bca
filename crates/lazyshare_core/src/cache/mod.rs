//! Read-through caching over authoritative data sources.
//!
//! # Responsibility
//! - Define the `Origin` capability a cache depends on.
//! - Memoize origin results per key for the lifetime of a proxy.
//!
//! # Invariants
//! - No expiry, size bound or invalidation; entries live as long as the proxy.

pub mod origin;
pub mod proxy;

pub use origin::{origin_fn, FnOrigin, Origin};
pub use proxy::{CacheStats, CachingProxy, FillPolicy};
