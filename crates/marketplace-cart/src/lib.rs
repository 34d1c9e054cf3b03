//! # marketplace-cart: Cart Store
//!
//! Client-side shopping cart state for the GoMarketplace storefront.
//! Consumers read the cart and call three operations; the store mirrors
//! every change into a key-value adapter so the cart survives restarts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cart Store Runtime                             │
//! │                                                                         │
//! │   UI screens ──► CartContext::use_cart() ──► CartHandle                │
//! │                                                 │                       │
//! │           add_to_cart / increment / decrement   │  products/subscribe  │
//! │                                                 ▼                       │
//! │   ┌───────────────────────────────────────────────────────────────┐   │
//! │   │ Shared: Mutex<CartState> + watch<CartSnapshot>                │   │
//! │   └───────────────┬───────────────────────────────┬───────────────┘   │
//! │                   │ nudge (coalesced)             │ rebase once        │
//! │                   ▼                               │                     │
//! │   ┌───────────────────────────┐   ┌───────────────┴───────────────┐   │
//! │   │ PersistenceWriter task    │   │ Hydration task                │   │
//! │   │ set(key, latest cart)     │   │ get(key) → decode → ready     │   │
//! │   └─────────────┬─────────────┘   └───────────────┬───────────────┘   │
//! │                 └──────────────┬──────────────────┘                    │
//! │                                ▼                                        │
//! │                 KeyValueStore (marketplace-store)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Mutations apply synchronously and are visible to every handle at once.
//! - Only one write is in flight; each write carries the newest cart, so
//!   once writes settle the stored blob equals the in-memory cart.
//! - Hydration never overwrites a mutation made before it finished.
//! - A failed write is logged and reported to the [`CartEventEmitter`]; the
//!   in-memory cart is not rolled back.
//!
//! ## Usage
//! ```rust,ignore
//! use marketplace_cart::{CartConfig, CartContext, CartStore};
//! use marketplace_core::NewLineItem;
//!
//! let store = CartStore::open_sqlite(CartConfig::load_or_default(None)).await?;
//! let context = CartContext::with_handle(store.handle());
//!
//! let cart = context.use_cart()?;
//! cart.add_to_cart(NewLineItem::new("a", "Shoe", "shoe.png", 10.0))?;
//! cart.increment("a")?;
//!
//! store.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod events;
mod hydration;
mod state;
pub mod store;
mod writer;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::CartConfig;
pub use context::CartContext;
pub use error::{CartError, CartResult};
pub use events::{CartEventEmitter, NoOpEmitter};
pub use state::CartSnapshot;
pub use store::{CartHandle, CartStore};

pub use marketplace_core::{CartChange, LineItem, NewLineItem};
