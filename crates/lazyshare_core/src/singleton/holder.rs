//! Double-checked holder for one lazily constructed shared instance.
//!
//! # Responsibility
//! - Construct the instance on first demand, exactly once per holder.
//! - Serve every later read without touching the construction lock.
//!
//! # Invariants
//! - At most one successful construction per holder.
//! - A published instance is never replaced or cleared.
//! - A failed or panicking construction leaves the holder empty and retryable.
//! - The construction lock is released on every exit path.

use log::{debug, error, info};
use once_cell::sync::OnceCell;
use std::any::type_name;
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

const STATE_UNINITIALIZED: u8 = 0;
const STATE_CONSTRUCTING: u8 = 1;
const STATE_READY: u8 = 2;

/// Lifecycle of a [`SingletonHolder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonState {
    /// Nothing published yet; the next caller constructs.
    Uninitialized,
    /// One caller holds the guard and is running the constructor.
    Constructing,
    /// Instance published; reads never block.
    Ready,
}

impl SingletonState {
    /// Stable lowercase label used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Constructing => "constructing",
            Self::Ready => "ready",
        }
    }
}

/// Lazily constructed, process-shareable instance slot.
///
/// `new` is `const`, so a holder can live in a `static` and be exposed
/// through an accessor function:
///
/// ```
/// use lazyshare_core::SingletonHolder;
///
/// struct Registry {
///     name: &'static str,
/// }
///
/// static REGISTRY: SingletonHolder<Registry> = SingletonHolder::new();
///
/// fn registry() -> &'static Registry {
///     REGISTRY.get_or_init(|| Registry { name: "main" })
/// }
///
/// assert!(std::ptr::eq(registry(), registry()));
/// assert_eq!(registry().name, "main");
/// ```
pub struct SingletonHolder<T> {
    // `OnceCell::get` is an acquire load paired with the release store in
    // `get_or_init`, so the unguarded fast path never sees a partial value.
    instance: OnceCell<T>,
    guard: Mutex<()>,
    state: AtomicU8,
}

impl<T> SingletonHolder<T> {
    /// Creates an empty holder.
    pub const fn new() -> Self {
        Self {
            instance: OnceCell::new(),
            guard: Mutex::new(()),
            state: AtomicU8::new(STATE_UNINITIALIZED),
        }
    }

    /// Returns the published instance without blocking.
    pub fn get(&self) -> Option<&T> {
        self.instance.get()
    }

    /// Returns whether an instance has been published.
    pub fn is_ready(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SingletonState {
        match self.state.load(Ordering::Acquire) {
            STATE_READY => SingletonState::Ready,
            STATE_CONSTRUCTING => SingletonState::Constructing,
            _ => SingletonState::Uninitialized,
        }
    }

    /// Returns the shared instance, constructing it on first call.
    ///
    /// `ctor` runs at most once across all callers of this holder. Callers
    /// racing the first construction block until it completes.
    pub fn get_or_init<F>(&self, ctor: F) -> &T
    where
        F: FnOnce() -> T,
    {
        match self.get_or_try_init(|| Ok::<T, Infallible>(ctor())) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Returns the shared instance, constructing it with a fallible `ctor`.
    ///
    /// # Errors
    /// - Returns the constructor's error unchanged. The holder stays empty
    ///   and the next caller runs its own constructor.
    pub fn get_or_try_init<F, E>(&self, ctor: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(instance) = self.instance.get() {
            return Ok(instance);
        }

        // The guard protects no data, so a poisoned lock only means an earlier
        // constructor panicked; the holder is still empty and safe to retry.
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = self.instance.get() {
            debug!(
                "event=singleton_init module=singleton status=already_created state={} type={}",
                self.state().as_str(),
                type_name::<T>()
            );
            return Ok(instance);
        }

        let started_at = Instant::now();
        let attempt = ConstructionAttempt::begin(&self.state);
        let value = match ctor() {
            Ok(value) => value,
            Err(err) => {
                drop(attempt);
                error!(
                    "event=singleton_init module=singleton status=error state={} type={} duration_ms={}",
                    self.state().as_str(),
                    type_name::<T>(),
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        let instance = self.instance.get_or_init(|| value);
        attempt.finish();
        info!(
            "event=singleton_init module=singleton status=created state={} type={} duration_ms={}",
            self.state().as_str(),
            type_name::<T>(),
            started_at.elapsed().as_millis()
        );
        Ok(instance)
    }
}

impl<T> Default for SingletonHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for SingletonHolder<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonHolder")
            .field("type", &type_name::<T>())
            .field("state", &self.state())
            .finish()
    }
}

/// Marks the holder as constructing; rolls back to uninitialized on drop
/// unless `finish` was called (constructor error or unwind).
struct ConstructionAttempt<'a> {
    state: &'a AtomicU8,
    finished: bool,
}

impl<'a> ConstructionAttempt<'a> {
    fn begin(state: &'a AtomicU8) -> Self {
        state.store(STATE_CONSTRUCTING, Ordering::Release);
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
        self.state.store(STATE_READY, Ordering::Release);
    }
}

impl Drop for ConstructionAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.store(STATE_UNINITIALIZED, Ordering::Release);
        }
    }
}
