//! Lazily constructed process-wide instances.
//!
//! # Responsibility
//! - Provide a const-constructible holder that builds one shared instance.
//! - Keep all mutation on the guarded construction path.
//!
//! # Invariants
//! - Holders are exposed through accessor functions, never as mutable statics.

mod holder;

pub use holder::{SingletonHolder, SingletonState};
