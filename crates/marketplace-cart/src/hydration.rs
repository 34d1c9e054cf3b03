//! # Hydration
//!
//! One-time load of the persisted cart at startup.
//!
//! ## Rebase
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Hydration                                    │
//! │                                                                         │
//! │   store.get(key) ──► decode(policy) ──► loaded cart (or empty)         │
//! │                                             │                           │
//! │   ops committed before ready ───────────────┤ replayed in order        │
//! │   (add "a", increment "b", ...)             ▼                           │
//! │                                      rebased cart ──► ready = true     │
//! │                                                                         │
//! │   Needs a write when ops were replayed or the blob was rejected /      │
//! │   trimmed; otherwise the store already holds this cart.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Loaded data never replaces a mutation: the in-memory cart that existed
//! before readiness is rebuilt from the loaded base plus the pending ops.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use marketplace_core::{codec, Cart};

use crate::error::CartError;
use crate::state::Shared;

/// What the store gave us.
struct Loaded {
    cart: Cart,

    /// The stored blob differs from `cart` and must be overwritten.
    rewrite: bool,
}

/// Reads the persisted cart and makes the store ready.
pub(crate) async fn hydrate(shared: Arc<Shared>) {
    debug!(key = %shared.key, "Hydrating cart");

    let loaded = load(&shared).await;
    finish(&shared, loaded);
}

async fn load(shared: &Shared) -> Loaded {
    let blob = match shared.store.get(&shared.key).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!(key = %shared.key, "No persisted cart");
            return Loaded {
                cart: Cart::new(),
                rewrite: false,
            };
        }
        Err(e) => {
            // Leave the stored blob alone; it may be readable next session
            error!(key = %shared.key, error = %e, "Failed to read persisted cart");
            shared.emitter.emit_error(&CartError::Store(e));
            return Loaded {
                cart: Cart::new(),
                rewrite: false,
            };
        }
    };

    match codec::decode(&blob, shared.policy) {
        Ok(decoded) => {
            if decoded.dropped > 0 {
                warn!(
                    key = %shared.key,
                    dropped = decoded.dropped,
                    "Dropped malformed cart entries"
                );
            }
            Loaded {
                cart: decoded.cart,
                rewrite: decoded.dropped > 0,
            }
        }
        Err(e) => {
            warn!(
                key = %shared.key,
                policy = %shared.policy,
                error = %e,
                "Discarding malformed persisted cart"
            );
            shared.emitter.emit_error(&CartError::Core(e));
            Loaded {
                cart: Cart::new(),
                rewrite: true,
            }
        }
    }
}

fn finish(shared: &Shared, loaded: Loaded) {
    let Loaded { mut cart, rewrite } = loaded;

    let (revision, items, replayed) = {
        let mut state = shared.lock_state();
        if state.ready {
            return;
        }

        let pending = std::mem::take(&mut state.pending);
        let replayed = pending.len();
        for op in &pending {
            if let Err(e) = cart.apply(op) {
                warn!(?op, error = %e, "Pending cart operation no longer applies");
            }
        }

        state.cart = cart;
        state.ready = true;
        state.revision += 1;
        shared.publish(&state);

        (state.revision, state.cart.len(), replayed)
    };

    if rewrite || replayed > 0 {
        shared.nudge_writer();
    } else {
        shared.mark_clean(revision);
    }

    info!(items, replayed, revision, "Cart hydrated");
    shared.emitter.emit_hydrated(items, replayed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_core::{CartOp, MalformedPolicy, NewLineItem};
    use marketplace_store::{KeyValueStore, MemoryStore};

    use crate::events::NoOpEmitter;

    const KEY: &str = "@Test:products";

    fn shared_over(
        store: MemoryStore,
        policy: MalformedPolicy,
    ) -> (Arc<Shared>, tokio::sync::mpsc::Receiver<()>) {
        Shared::new(KEY.into(), policy, Arc::new(store), Arc::new(NoOpEmitter))
    }

    #[tokio::test]
    async fn test_hydrates_persisted_cart() {
        let store = MemoryStore::with_entry(
            KEY,
            r#"[{"id":"b","title":"Hat","imageUrl":"u2","price":5,"quantity":2}]"#,
        );
        let (shared, mut nudge_rx) = shared_over(store, MalformedPolicy::DiscardBlob);

        hydrate(shared.clone()).await;

        let snapshot = shared.snapshot();
        assert!(snapshot.ready);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.items()[0].id, "b");
        assert_eq!(snapshot.items()[0].quantity, 2);

        // Store already matches, nothing to write
        assert!(nudge_rx.try_recv().is_err());
        assert_eq!(shared.subscribe_persist().borrow().revision, snapshot.revision);
    }

    #[tokio::test]
    async fn test_pending_ops_are_rebased() {
        let store = MemoryStore::with_entry(
            KEY,
            r#"[{"id":"b","title":"Hat","image_url":"u2","price":5.0,"quantity":2}]"#,
        );
        let (shared, mut nudge_rx) = shared_over(store, MalformedPolicy::DiscardBlob);

        {
            let mut state = shared.lock_state();
            let ops = [
                CartOp::Add(NewLineItem::new("a", "Shoe", "u", 10.0)),
                CartOp::Add(NewLineItem::new("b", "Hat", "u2", 5.0)),
            ];
            for op in ops {
                state.cart.apply(&op).unwrap();
                state.pending.push(op);
            }
        }

        hydrate(shared.clone()).await;

        let snapshot = shared.snapshot();
        let lines: Vec<(&str, u32)> = snapshot
            .items()
            .iter()
            .map(|item| (item.id.as_str(), item.quantity))
            .collect();
        assert_eq!(lines, vec![("b", 3), ("a", 1)]);
        assert!(shared.lock_state().pending.is_empty());
        assert!(nudge_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_malformed_blob_starts_empty_and_rewrites() {
        let store = MemoryStore::with_entry(KEY, "{not json");
        let (shared, mut nudge_rx) = shared_over(store, MalformedPolicy::DiscardBlob);

        hydrate(shared.clone()).await;

        let snapshot = shared.snapshot();
        assert!(snapshot.ready);
        assert!(snapshot.is_empty());
        assert!(nudge_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_drop_entries_keeps_valid_lines() {
        let store = MemoryStore::with_entry(
            KEY,
            r#"[
                {"id":"a","title":"Shoe","image_url":"u","price":10,"quantity":1},
                {"id":"z","title":"Broken","image_url":"u","price":1,"quantity":0}
            ]"#,
        );
        let (shared, mut nudge_rx) = shared_over(store, MalformedPolicy::DropEntries);

        hydrate(shared.clone()).await;

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.items()[0].id, "a");
        assert!(nudge_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_missing_blob_is_empty_and_clean() {
        let store = MemoryStore::new();
        let (shared, mut nudge_rx) = shared_over(store, MalformedPolicy::DiscardBlob);

        hydrate(shared.clone()).await;

        assert!(shared.snapshot().ready);
        assert!(shared.snapshot().is_empty());
        assert!(nudge_rx.try_recv().is_err());
        assert_eq!(shared.store.get(KEY).await.unwrap(), None);
    }
}
