//! # Cart Store
//!
//! Owner of the cart and the background tasks that load and persist it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CartStore Lifecycle                            │
//! │                                                                         │
//! │  CartStore::open(store, config)                                        │
//! │       │  spawns hydration task + writer task                           │
//! │       ▼                                                                 │
//! │  handle() ──► CartHandle (Clone) ──► UI consumers                      │
//! │       │        products / subscribe / add_to_cart / increment / ...    │
//! │       ▼                                                                 │
//! │  shutdown().await                                                      │
//! │       │  closes handles, bounded flush, stops writer                   │
//! │       ▼                                                                 │
//! │  handle.add_to_cart(..) ──► Err(CartError::Closed)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation Path
//! A mutation takes the state lock, applies the change, bumps the revision
//! when something changed, publishes a snapshot and nudges the writer. It
//! returns before the write resolves.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use marketplace_core::{CartChange, CartOp, LineItem, NewLineItem};
use marketplace_store::{KeyValueStore, SqliteStore, StoreConfig};

use crate::config::CartConfig;
use crate::error::{CartError, CartResult};
use crate::events::{CartEventEmitter, NoOpEmitter};
use crate::hydration;
use crate::state::{CartSnapshot, Shared};
use crate::writer::PersistenceWriter;

// =============================================================================
// Cart Store
// =============================================================================

/// Owns the cart session. Dropping it stops persistence and closes every
/// outstanding handle; prefer [`CartStore::shutdown`] to flush first.
pub struct CartStore {
    shared: Arc<Shared>,
    config: CartConfig,
    shutdown_tx: Option<mpsc::Sender<()>>,
    writer: Option<JoinHandle<()>>,
}

impl CartStore {
    /// Opens a cart over `store` and starts hydration.
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(store: Arc<dyn KeyValueStore>, config: CartConfig) -> Self {
        Self::with_emitter(store, config, Arc::new(NoOpEmitter))
    }

    /// Opens a cart with a custom event emitter.
    pub fn with_emitter(
        store: Arc<dyn KeyValueStore>,
        config: CartConfig,
        emitter: Arc<dyn CartEventEmitter>,
    ) -> Self {
        let key = config.storage_key();

        info!(
            key = %key,
            policy = %config.malformed_policy(),
            "Opening cart store"
        );

        let (shared, nudge_rx) = Shared::new(key, config.malformed_policy(), store, emitter);
        let (writer, shutdown_tx) = PersistenceWriter::new(shared.clone(), nudge_rx);

        let writer = tokio::spawn(writer.run());
        tokio::spawn(hydration::hydrate(shared.clone()));

        CartStore {
            shared,
            config,
            shutdown_tx: Some(shutdown_tx),
            writer: Some(writer),
        }
    }

    /// Opens the SQLite database named by `config` and a cart over it.
    pub async fn open_sqlite(config: CartConfig) -> CartResult<Self> {
        config.validate()?;

        let path = config.database_path().ok_or_else(|| {
            CartError::InvalidConfig("No database path configured or discoverable".into())
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CartError::InvalidConfig(format!(
                        "Cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = SqliteStore::open(StoreConfig::new(path)).await?;
        Ok(Self::open(Arc::new(store), config))
    }

    /// Returns a new handle for a consumer.
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            shared: self.shared.clone(),
        }
    }

    /// Returns the configuration this store was opened with.
    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Closes the cart, waits up to the configured timeout for the last
    /// write, then stops the writer.
    ///
    /// The timeout covers both the flush and the writer stopping; a writer
    /// still inside a slow `set` at the deadline is aborted. The cart is
    /// closed even when the flush fails; the error is returned so callers
    /// can report it.
    pub async fn shutdown(mut self) -> CartResult<()> {
        info!("Shutting down cart store");

        let timeout_ms = self.config.persistence.shutdown_flush_timeout_ms;
        let deadline = Instant::now() + self.config.shutdown_flush_timeout();

        let mut flushed = match tokio::time::timeout_at(deadline, flush_shared(&self.shared)).await
        {
            Ok(result) => result,
            Err(_) => Err(CartError::FlushTimeout(timeout_ms)),
        };

        self.shared.close();

        if let Some(tx) = self.shutdown_tx.take() {
            // Capacity 1 and only ever sent once
            let _ = tx.try_send(());
        }

        if let Some(mut writer) = self.writer.take() {
            match tokio::time::timeout_at(deadline, &mut writer).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Cart writer task ended abnormally"),
                Err(_) => {
                    warn!(timeout_ms, "Cart writer did not stop in time, aborting");
                    writer.abort();
                    self.shared.mark_writer_stopped();
                    if flushed.is_ok() {
                        flushed = Err(CartError::FlushTimeout(timeout_ms));
                    }
                }
            }
        }

        if let Err(ref e) = flushed {
            warn!(error = %e, "Cart store stopped with unsaved changes");
        }

        info!("Cart store stopped");
        flushed
    }
}

impl Drop for CartStore {
    fn drop(&mut self) {
        // Dropping shutdown_tx stops the writer
        self.shared.close();
    }
}

// =============================================================================
// Cart Handle
// =============================================================================

/// Consumer capability: read the cart and call the three operations.
#[derive(Clone)]
pub struct CartHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHandle")
            .field("key", &self.shared.key)
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl CartHandle {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Current line items in cart order.
    pub fn products(&self) -> Vec<LineItem> {
        self.shared.snapshot().items.to_vec()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> CartSnapshot {
        self.shared.snapshot()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.shared.subscribe()
    }

    /// Whether hydration has completed.
    pub fn is_ready(&self) -> bool {
        self.shared.snapshot().ready
    }

    /// Whether the owning store has been shut down or dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Waits until hydration has completed.
    pub async fn wait_ready(&self) -> CartResult<()> {
        let mut rx = self.shared.subscribe();
        rx.wait_for(|snapshot| snapshot.ready)
            .await
            .map(|_| ())
            .map_err(|_| CartError::Closed)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Adds one unit of `item`; an existing line with the same id is
    /// incremented instead of duplicated.
    pub fn add_to_cart(&self, item: NewLineItem) -> CartResult<CartChange> {
        self.commit(CartOp::Add(item))
    }

    /// Adds one unit to the line with `id`. Unknown ids are a no-op.
    pub fn increment(&self, id: &str) -> CartResult<CartChange> {
        self.commit(CartOp::Increment(id.to_string()))
    }

    /// Removes one unit from the line with `id`, dropping the line at zero.
    /// Unknown ids are a no-op.
    pub fn decrement(&self, id: &str) -> CartResult<CartChange> {
        self.commit(CartOp::Decrement(id.to_string()))
    }

    /// Waits until the writer has attempted the current revision.
    ///
    /// Returns the write error if that attempt failed.
    pub async fn flush(&self) -> CartResult<()> {
        if self.shared.is_closed() {
            return Err(CartError::Closed);
        }
        flush_shared(&self.shared).await
    }

    fn commit(&self, op: CartOp) -> CartResult<CartChange> {
        if self.shared.is_closed() {
            return Err(CartError::Closed);
        }

        let (change, revision) = {
            let mut state = self.shared.lock_state();
            let change = state.cart.apply(&op)?;

            if change.is_modified() {
                if !state.ready {
                    state.pending.push(op.clone());
                }
                state.revision += 1;
                self.shared.publish(&state);
            }

            (change, state.revision)
        };

        debug!(?op, ?change, revision, "Cart mutation");

        // No-ops still nudge so the store converges after an earlier failed write
        self.shared.nudge_writer();

        Ok(change)
    }
}

/// Waits for the writer to reach the revision current at call time.
async fn flush_shared(shared: &Shared) -> CartResult<()> {
    let target = shared.lock_state().revision;

    let mut rx = shared.subscribe_persist();
    let status = rx
        .wait_for(|status| status.revision >= target || status.stopped)
        .await
        .map_err(|_| CartError::Closed)?
        .clone();

    if status.revision < target {
        return Err(CartError::Closed);
    }

    match status.last_error {
        Some(message) => Err(CartError::PersistenceWrite {
            revision: status.revision,
            message,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_store::MemoryStore;

    fn item(id: &str) -> NewLineItem {
        NewLineItem::new(id, format!("Product {}", id), format!("{}.png", id), 10.0)
    }

    async fn ready_store() -> (CartStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store = CartStore::open(memory.clone(), CartConfig::default());
        store.handle().wait_ready().await.unwrap();
        (store, memory)
    }

    #[tokio::test]
    async fn test_example_sequence() {
        let (store, memory) = ready_store().await;
        let cart = store.handle();

        assert_eq!(cart.add_to_cart(item("a")).unwrap(), CartChange::Inserted);
        assert_eq!(
            cart.add_to_cart(item("a")).unwrap(),
            CartChange::Updated { quantity: 2 }
        );
        assert_eq!(
            cart.increment("a").unwrap(),
            CartChange::Updated { quantity: 3 }
        );
        assert_eq!(cart.products().len(), 1);
        assert_eq!(cart.products()[0].quantity, 3);

        cart.decrement("a").unwrap();
        cart.decrement("a").unwrap();
        assert_eq!(cart.decrement("a").unwrap(), CartChange::Removed);
        assert!(cart.products().is_empty());

        assert_eq!(cart.increment("missing-id").unwrap(), CartChange::Unchanged);
        assert!(cart.products().is_empty());

        cart.flush().await.unwrap();
        assert_eq!(
            memory.get("@GoMarketplace:products").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_mutation_is_visible_before_write() {
        let (store, _memory) = ready_store().await;
        let cart = store.handle();
        let other = cart.clone();

        cart.add_to_cart(item("a")).unwrap();

        // Synchronous: visible through any handle without awaiting
        assert_eq!(other.products()[0].id, "a");
    }

    #[tokio::test]
    async fn test_subscribers_see_revisions() {
        let (store, _memory) = ready_store().await;
        let cart = store.handle();
        let mut rx = cart.subscribe();
        let start = rx.borrow_and_update().revision;

        cart.add_to_cart(item("a")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().revision, start + 1);

        // Unknown id does not publish
        cart.increment("nope").unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_item_is_rejected_without_change() {
        let (store, _memory) = ready_store().await;
        let cart = store.handle();
        let before = cart.snapshot().revision;

        let err = cart
            .add_to_cart(NewLineItem::new("a", "Shoe", "u", f64::INFINITY))
            .unwrap_err();

        assert!(matches!(err, CartError::Core(_)));
        assert_eq!(cart.snapshot().revision, before);
        assert!(cart.products().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_flushes_and_closes() {
        let (store, memory) = ready_store().await;
        let cart = store.handle();

        cart.add_to_cart(item("a")).unwrap();
        store.shutdown().await.unwrap();

        let blob = memory.get("@GoMarketplace:products").await.unwrap().unwrap();
        assert!(blob.contains("\"a\""));

        assert!(cart.is_closed());
        assert!(matches!(cart.increment("a"), Err(CartError::Closed)));
        assert!(matches!(cart.flush().await, Err(CartError::Closed)));
        // Reads keep returning the last cart
        assert_eq!(cart.products().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_closes_handles() {
        let (store, _memory) = ready_store().await;
        let cart = store.handle();

        drop(store);

        assert!(matches!(
            cart.add_to_cart(item("a")),
            Err(CartError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_open_sqlite_uses_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CartConfig::default();
        config.storage.database_path = Some(dir.path().join("data").join("cart.db"));

        let store = CartStore::open_sqlite(config).await.unwrap();
        let cart = store.handle();
        cart.wait_ready().await.unwrap();
        cart.add_to_cart(item("a")).unwrap();
        store.shutdown().await.unwrap();

        assert!(dir.path().join("data").join("cart.db").exists());
    }
}
