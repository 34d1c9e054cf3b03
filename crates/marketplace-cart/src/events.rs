//! # Cart Events
//!
//! Observability hook for things consumers cannot see through the cart
//! snapshot: hydration results, completed writes and persistence failures.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Event Flow                                 │
//! │                                                                         │
//! │  Hydration task ──► emit_hydrated(items, replayed)                     │
//! │                 └─► emit_error(Store / Core)      (bad read or blob)   │
//! │                                                                         │
//! │  Writer task    ──► emit_persisted(revision)                           │
//! │                 └─► emit_error(PersistenceWrite)  (set rejected)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Emitters are called from the background tasks and must not block.

use crate::error::CartError;

/// Receives cart lifecycle and persistence events.
pub trait CartEventEmitter: Send + Sync {
    /// Hydration finished; `items` lines are in the cart, `replayed` of the
    /// operations committed before readiness were reapplied on top.
    fn emit_hydrated(&self, items: usize, replayed: usize);

    /// The cart as of `revision` reached the store.
    fn emit_persisted(&self, revision: u64);

    /// A read, decode or write failed. The in-memory cart is unaffected.
    fn emit_error(&self, error: &CartError);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl CartEventEmitter for NoOpEmitter {
    fn emit_hydrated(&self, _items: usize, _replayed: usize) {}
    fn emit_persisted(&self, _revision: u64) {}
    fn emit_error(&self, _error: &CartError) {}
}
