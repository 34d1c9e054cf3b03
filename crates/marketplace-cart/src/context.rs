//! # Cart Context
//!
//! Explicit provider slot for UI code that cannot thread a [`CartHandle`]
//! through every call. The app shell provides the handle once the store is
//! open; screens call [`CartContext::use_cart`].
//!
//! ```text
//! ┌──────────────────┐  provide(handle)  ┌──────────────┐  use_cart()  ┌────────┐
//! │ App shell        │ ────────────────► │ CartContext  │ ◄─────────── │ Screen │
//! │ (owns CartStore) │                   │ (Clone)      │ ───────────► │        │
//! └──────────────────┘                   └──────────────┘ CartHandle   └────────┘
//!                                                          or NotProvided / Closed
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{CartError, CartResult};
use crate::store::CartHandle;

/// Shared slot holding the session's cart handle.
#[derive(Debug, Clone, Default)]
pub struct CartContext {
    slot: Arc<RwLock<Option<CartHandle>>>,
}

impl CartContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context already holding `handle`.
    pub fn with_handle(handle: CartHandle) -> Self {
        let context = Self::new();
        context.provide(handle);
        context
    }

    /// Installs `handle`, replacing any previous one.
    pub fn provide(&self, handle: CartHandle) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.replace(handle).is_some() {
            debug!("Replaced provided cart handle");
        }
    }

    /// Returns the provided handle.
    ///
    /// Fails with [`CartError::NotProvided`] before `provide`, and with
    /// [`CartError::Closed`] once the owning store is shut down.
    pub fn use_cart(&self) -> CartResult<CartHandle> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(handle) if handle.is_closed() => Err(CartError::Closed),
            Some(handle) => Ok(handle.clone()),
            None => Err(CartError::NotProvided),
        }
    }

    /// Whether a handle is installed.
    pub fn is_provided(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Removes the handle at session end.
    pub fn clear(&self) -> Option<CartHandle> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_core::NewLineItem;
    use marketplace_store::MemoryStore;

    use crate::config::CartConfig;
    use crate::store::CartStore;

    #[test]
    fn test_use_cart_without_provider() {
        let context = CartContext::new();

        let err = context.use_cart().unwrap_err();
        assert!(matches!(err, CartError::NotProvided));
        assert!(err.is_usage_error());
    }

    #[tokio::test]
    async fn test_provided_handle_shares_cart() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), CartConfig::default());
        let context = CartContext::with_handle(store.handle());
        let screen = context.clone();

        let cart = screen.use_cart().unwrap();
        cart.wait_ready().await.unwrap();
        cart.add_to_cart(NewLineItem::new("a", "Shoe", "u", 10.0))
            .unwrap();

        assert_eq!(context.use_cart().unwrap().products().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_store_is_usage_error() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), CartConfig::default());
        let context = CartContext::with_handle(store.handle());

        store.shutdown().await.unwrap();

        assert!(matches!(context.use_cart(), Err(CartError::Closed)));
    }

    #[tokio::test]
    async fn test_clear() {
        let store = CartStore::open(Arc::new(MemoryStore::new()), CartConfig::default());
        let context = CartContext::with_handle(store.handle());
        assert!(context.is_provided());

        assert!(context.clear().is_some());
        assert!(!context.is_provided());
        assert!(matches!(context.use_cart(), Err(CartError::NotProvided)));
    }
}
