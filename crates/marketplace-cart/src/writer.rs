//! # Persistence Writer
//!
//! The only task that calls `set` on the cart key.
//!
//! ## Write Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       PersistenceWriter::run                            │
//! │                                                                         │
//! │  wait for ready ──► loop {                                             │
//! │                        nudge ──► lock, read LATEST cart + revision,    │
//! │                                  unlock                                 │
//! │                              ──► encode ──► store.set(key, blob)       │
//! │                              ──► record revision / error               │
//! │                        shutdown ──► break                              │
//! │                     }                                                   │
//! │                                                                         │
//! │  Mutation during a set()  → nudge stays queued → one more write of     │
//! │  the newest cart. Writes never overlap, so the last one to land is     │
//! │  always the last one started, and it carries the newest revision.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use marketplace_core::codec;

use crate::error::CartError;
use crate::state::Shared;

// =============================================================================
// Persistence Writer
// =============================================================================

/// Serialises cart writes for one storage key.
pub(crate) struct PersistenceWriter {
    shared: Arc<Shared>,

    /// Coalesced "cart changed" signals.
    nudge_rx: mpsc::Receiver<()>,

    /// Shutdown receiver. Dropping the sender also stops the writer.
    shutdown_rx: mpsc::Receiver<()>,
}

impl PersistenceWriter {
    /// Creates a writer and the sender that stops it.
    pub fn new(shared: Arc<Shared>, nudge_rx: mpsc::Receiver<()>) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer = PersistenceWriter {
            shared,
            nudge_rx,
            shutdown_rx,
        };

        (writer, shutdown_tx)
    }

    /// Runs the writer loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(key = %self.shared.key, "Cart writer starting");

        let mut snapshots = self.shared.subscribe();

        // No write may land before hydration has read the key
        let hydrated = tokio::select! {
            result = snapshots.wait_for(|snapshot| snapshot.ready) => result.is_ok(),
            _ = self.shutdown_rx.recv() => false,
        };

        if hydrated {
            loop {
                tokio::select! {
                    Some(()) = self.nudge_rx.recv() => {
                        self.write_latest().await;
                    }

                    _ = self.shutdown_rx.recv() => {
                        info!("Cart writer shutting down");
                        break;
                    }
                }
            }
        }

        self.shared.mark_writer_stopped();
        info!("Cart writer stopped");
    }

    /// Writes the cart as it is right now.
    async fn write_latest(&self) {
        let (revision, encoded) = {
            let state = self.shared.lock_state();
            (state.revision, codec::encode(&state.cart))
        };

        let blob = match encoded {
            Ok(blob) => blob,
            Err(e) => {
                error!(revision, error = %e, "Failed to encode cart");
                self.fail(revision, e.to_string());
                return;
            }
        };

        match self.shared.store.set(&self.shared.key, &blob).await {
            Ok(()) => {
                debug!(revision, bytes = blob.len(), "Cart persisted");
                self.shared.record_write(revision, None);
                self.shared.emitter.emit_persisted(revision);
            }
            Err(e) => {
                // The in-memory cart is kept; the next mutation rewrites it in full
                error!(revision, key = %self.shared.key, error = %e, "Failed to persist cart");
                self.fail(revision, e.to_string());
            }
        }
    }

    fn fail(&self, revision: u64, message: String) {
        self.shared.record_write(revision, Some(message.clone()));
        self.shared
            .emitter
            .emit_error(&CartError::PersistenceWrite { revision, message });
    }
}
