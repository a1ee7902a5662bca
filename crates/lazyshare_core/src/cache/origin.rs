//! Origin contract consumed by caching proxies.
//!
//! # Responsibility
//! - Describe an authoritative key-to-value source with one fetch operation.
//! - Adapt closures and shared handles into origins.
//!
//! # Invariants
//! - `fetch` is synchronous and may be repeated for the same key.

use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// Authoritative, potentially expensive data source.
pub trait Origin {
    type Key;
    type Value;
    type Error;

    /// Fetches the current value for `key` from the source of truth.
    fn fetch(&self, key: &Self::Key) -> Result<Self::Value, Self::Error>;
}

impl<O: Origin + ?Sized> Origin for Arc<O> {
    type Key = O::Key;
    type Value = O::Value;
    type Error = O::Error;

    fn fetch(&self, key: &Self::Key) -> Result<Self::Value, Self::Error> {
        (**self).fetch(key)
    }
}

impl<O: Origin + ?Sized> Origin for &O {
    type Key = O::Key;
    type Value = O::Value;
    type Error = O::Error;

    fn fetch(&self, key: &Self::Key) -> Result<Self::Value, Self::Error> {
        (**self).fetch(key)
    }
}

/// Origin backed by a closure. Built with [`origin_fn`].
pub struct FnOrigin<K, V, E, F> {
    fetch: F,
    _marker: PhantomData<fn(&K) -> Result<V, E>>,
}

/// Wraps `fetch` as an [`Origin`].
///
/// ```
/// use lazyshare_core::{origin_fn, Origin};
///
/// let origin = origin_fn(|key: &String| Ok::<_, String>(format!("Data for key {key}")));
/// assert_eq!(origin.fetch(&"ABC".to_string()).unwrap(), "Data for key ABC");
/// ```
pub fn origin_fn<K, V, E, F>(fetch: F) -> FnOrigin<K, V, E, F>
where
    F: Fn(&K) -> Result<V, E>,
{
    FnOrigin {
        fetch,
        _marker: PhantomData,
    }
}

impl<K, V, E, F> Origin for FnOrigin<K, V, E, F>
where
    F: Fn(&K) -> Result<V, E>,
{
    type Key = K;
    type Value = V;
    type Error = E;

    fn fetch(&self, key: &K) -> Result<V, E> {
        (self.fetch)(key)
    }
}

impl<K, V, E, F> Debug for FnOrigin<K, V, E, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOrigin").finish_non_exhaustive()
    }
}
