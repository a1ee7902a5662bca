//! Read-through caching proxy over an [`Origin`].
//!
//! # Responsibility
//! - Serve previously fetched values without consulting the origin.
//! - Fetch, store and return on miss.
//!
//! # Invariants
//! - Stored entries are never refreshed, evicted or invalidated.
//! - Failed fetches store nothing; the next `get` retries the origin.
//! - Under [`FillPolicy::Coalesced`] each key is fetched successfully at most
//!   once, even under concurrent misses.
//! - Under [`FillPolicy::Relaxed`] concurrent misses may fetch the same key
//!   more than once; the first stored value wins.

use crate::cache::origin::Origin;
use crate::config::CacheConfig;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::time::Instant;

/// How concurrent misses on the same key are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Misses on one key wait for the in-flight fetch and reuse its result.
    #[default]
    Coalesced,
    /// Every miss fetches on its own; duplicate fills are discarded.
    Relaxed,
}

impl FillPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coalesced => "coalesced",
            Self::Relaxed => "relaxed",
        }
    }
}

/// Point-in-time counters for one proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Origin fetches issued.
    pub misses: u64,
    /// Origin fetches that failed.
    pub fetch_errors: u64,
}

type KeyLock = Arc<Mutex<()>>;

/// Memoizing decorator: each distinct key is served by the origin once.
pub struct CachingProxy<O: Origin> {
    origin: O,
    policy: FillPolicy,
    entries: RwLock<HashMap<O::Key, O::Value>>,
    in_flight: Mutex<HashMap<O::Key, KeyLock>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetch_errors: AtomicU64,
}

impl<O> CachingProxy<O>
where
    O: Origin,
    O::Key: Eq + Hash + Clone,
    O::Value: Clone,
{
    /// Wraps `origin` with the default [`FillPolicy::Coalesced`].
    pub fn new(origin: O) -> Self {
        Self::with_policy(origin, FillPolicy::default())
    }

    /// Wraps `origin` with an explicit fill policy.
    pub fn with_policy(origin: O, policy: FillPolicy) -> Self {
        Self {
            origin,
            policy,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
        }
    }

    /// Wraps `origin` using the fill policy from `config`.
    pub fn from_config(origin: O, config: &CacheConfig) -> Self {
        Self::with_policy(origin, config.fill_policy)
    }

    /// Returns the cached value for `key`, fetching from the origin on miss.
    ///
    /// # Errors
    /// - Returns the origin's error unchanged when the miss fetch fails.
    pub fn get(&self, key: &O::Key) -> Result<O::Value, O::Error> {
        if let Some(value) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("event=cache_get module=cache status=hit");
            return Ok(value);
        }

        match self.policy {
            FillPolicy::Relaxed => self.fill(key),
            FillPolicy::Coalesced => self.fill_coalesced(key),
        }
    }

    /// Returns whether `key` has a stored value.
    pub fn contains(&self, key: &O::Key) -> bool {
        self.read_entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Returns a snapshot of hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
        }
    }

    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    /// Returns the wrapped origin.
    pub fn origin(&self) -> &O {
        &self.origin
    }

    fn lookup(&self, key: &O::Key) -> Option<O::Value> {
        self.read_entries().get(key).cloned()
    }

    fn fill(&self, key: &O::Key) -> Result<O::Value, O::Error> {
        let started_at = Instant::now();
        self.misses.fetch_add(1, Ordering::Relaxed);

        let value = match self.origin.fetch(key) {
            Ok(value) => value,
            Err(err) => {
                self.fetch_errors.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "event=cache_get module=cache status=error policy={} duration_ms={}",
                    self.policy.as_str(),
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        let stored = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(value)
            .clone();
        info!(
            "event=cache_get module=cache status=filled policy={} duration_ms={}",
            self.policy.as_str(),
            started_at.elapsed().as_millis()
        );
        Ok(stored)
    }

    fn fill_coalesced(&self, key: &O::Key) -> Result<O::Value, O::Error> {
        let key_lock = self.acquire_key_lock(key);
        let result = {
            let _fetching = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
            match self.lookup(key) {
                Some(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("event=cache_get module=cache status=hit_after_wait");
                    Ok(value)
                }
                None => self.fill(key),
            }
        };
        self.release_key_lock(key, key_lock);
        result
    }

    fn acquire_key_lock(&self, key: &O::Key) -> KeyLock {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(key.clone()).or_default())
    }

    fn release_key_lock(&self, key: &O::Key, key_lock: KeyLock) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are cloned and dropped only under `in_flight`, so a count of
        // one means no caller is waiting on this key any more.
        drop(key_lock);
        if in_flight
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            in_flight.remove(key);
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<O::Key, O::Value>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A proxy is itself an origin, so proxies can stand in for their source.
impl<O> Origin for CachingProxy<O>
where
    O: Origin,
    O::Key: Eq + Hash + Clone,
    O::Value: Clone,
{
    type Key = O::Key;
    type Value = O::Value;
    type Error = O::Error;

    fn fetch(&self, key: &Self::Key) -> Result<Self::Value, Self::Error> {
        self.get(key)
    }
}

impl<O: Origin> Debug for CachingProxy<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("CachingProxy")
            .field("policy", &self.policy)
            .field("entries", &len)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
