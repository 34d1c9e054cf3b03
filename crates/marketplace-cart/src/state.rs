//! # Shared Cart State
//!
//! The single authoritative cart plus the channels that fan it out.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shared (Arc)                                   │
//! │                                                                         │
//! │  state: Mutex<CartState>                                               │
//! │    cart, revision, ready, pending ops (until ready)                    │
//! │        │                                                                │
//! │        ├──► snapshot_tx: watch<CartSnapshot>   ──► UI subscribers      │
//! │        ├──► nudge_tx: mpsc(1)                  ──► writer task         │
//! │        └──► persist_tx: watch<PersistStatus>   ◄── writer task         │
//! │                                                   (flush waits here)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is never held across an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::debug;

use marketplace_core::{Cart, CartOp, LineItem, MalformedPolicy};
use marketplace_store::KeyValueStore;

use crate::events::CartEventEmitter;

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable view of the cart published after every change.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    /// Monotonic counter, bumped by every modifying mutation and by hydration.
    pub revision: u64,

    /// Whether hydration has completed.
    pub ready: bool,

    /// Line items in first-insertion order.
    pub items: Arc<[LineItem]>,
}

impl CartSnapshot {
    pub(crate) fn initial() -> Self {
        CartSnapshot {
            revision: 0,
            ready: false,
            items: Arc::from(Vec::new()),
        }
    }

    /// Line items in cart order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Looks up a line by id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.is(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

// =============================================================================
// Persist Status
// =============================================================================

/// Progress of the writer task.
#[derive(Debug, Clone, Default)]
pub(crate) struct PersistStatus {
    /// Highest revision the writer has attempted (or that needs no write).
    pub revision: u64,

    /// Error of the most recent attempt, cleared by the next success.
    pub last_error: Option<String>,

    /// Set once the writer task has exited.
    pub stopped: bool,
}

// =============================================================================
// Cart State
// =============================================================================

pub(crate) struct CartState {
    pub cart: Cart,
    pub revision: u64,
    pub ready: bool,

    /// Operations committed before hydration, replayed onto the loaded cart.
    pub pending: Vec<CartOp>,
}

impl CartState {
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            revision: self.revision,
            ready: self.ready,
            items: Arc::from(self.cart.items()),
        }
    }
}

// =============================================================================
// Shared
// =============================================================================

pub(crate) struct Shared {
    state: Mutex<CartState>,
    snapshot_tx: watch::Sender<CartSnapshot>,
    persist_tx: watch::Sender<PersistStatus>,
    nudge_tx: mpsc::Sender<()>,
    closed: AtomicBool,

    pub key: String,
    pub policy: MalformedPolicy,
    pub store: Arc<dyn KeyValueStore>,
    pub emitter: Arc<dyn CartEventEmitter>,
}

impl Shared {
    /// Builds the shared state and returns the writer's nudge receiver.
    pub fn new(
        key: String,
        policy: MalformedPolicy,
        store: Arc<dyn KeyValueStore>,
        emitter: Arc<dyn CartEventEmitter>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        // Capacity 1: a pending nudge already means "write the latest cart"
        let (nudge_tx, nudge_rx) = mpsc::channel(1);
        let (snapshot_tx, _) = watch::channel(CartSnapshot::initial());
        let (persist_tx, _) = watch::channel(PersistStatus::default());

        let shared = Shared {
            state: Mutex::new(CartState {
                cart: Cart::new(),
                revision: 0,
                ready: false,
                pending: Vec::new(),
            }),
            snapshot_tx,
            persist_tx,
            nudge_tx,
            closed: AtomicBool::new(false),
            key,
            policy,
            store,
            emitter,
        };

        (Arc::new(shared), nudge_rx)
    }

    /// Locks the cart state.
    ///
    /// Mutations never panic while holding the lock, so a poisoned lock
    /// still guards a consistent cart.
    pub fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the current state to subscribers. Call with the lock held
    /// so snapshots go out in revision order.
    pub fn publish(&self, state: &CartState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_persist(&self) -> watch::Receiver<PersistStatus> {
        self.persist_tx.subscribe()
    }

    /// Asks the writer to persist the latest cart. Never blocks.
    pub fn nudge_writer(&self) {
        match self.nudge_tx.try_send(()) {
            // Full: a write of the latest cart is already queued
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!("Writer stopped, change stays in memory only");
            }
        }
    }

    /// Records the outcome of a write attempt for `revision`.
    pub fn record_write(&self, revision: u64, error: Option<String>) {
        self.persist_tx.send_modify(|status| {
            status.revision = status.revision.max(revision);
            status.last_error = error;
        });
    }

    /// Marks `revision` as already matching the store.
    pub fn mark_clean(&self, revision: u64) {
        self.persist_tx.send_modify(|status| {
            status.revision = status.revision.max(revision);
        });
    }

    pub fn mark_writer_stopped(&self) {
        self.persist_tx.send_modify(|status| status.stopped = true);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_core::NewLineItem;
    use marketplace_store::MemoryStore;

    use crate::events::NoOpEmitter;

    fn shared() -> (Arc<Shared>, mpsc::Receiver<()>) {
        Shared::new(
            "@Test:products".into(),
            MalformedPolicy::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpEmitter),
        )
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let (shared, _nudge_rx) = shared();
        let rx = shared.subscribe();

        {
            let mut state = shared.lock_state();
            state
                .cart
                .add(NewLineItem::new("a", "Shoe", "u", 10.0))
                .unwrap();
            state.revision += 1;
            shared.publish(&state);
        }

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("a").map(|item| item.quantity), Some(1));
        assert_eq!(snapshot.total_quantity(), 1);
    }

    #[test]
    fn test_nudges_coalesce() {
        let (shared, mut nudge_rx) = shared();

        shared.nudge_writer();
        shared.nudge_writer();
        shared.nudge_writer();

        assert!(nudge_rx.try_recv().is_ok());
        assert!(nudge_rx.try_recv().is_err());
    }

    #[test]
    fn test_nudge_after_writer_gone_is_harmless() {
        let (shared, nudge_rx) = shared();
        drop(nudge_rx);

        shared.nudge_writer();
    }

    #[test]
    fn test_record_write_keeps_highest_revision() {
        let (shared, _nudge_rx) = shared();
        let rx = shared.subscribe_persist();

        shared.record_write(5, None);
        shared.mark_clean(3);
        assert_eq!(rx.borrow().revision, 5);

        shared.record_write(6, Some("disk full".into()));
        assert_eq!(rx.borrow().last_error.as_deref(), Some("disk full"));

        shared.record_write(7, None);
        assert!(rx.borrow().last_error.is_none());
    }
}
