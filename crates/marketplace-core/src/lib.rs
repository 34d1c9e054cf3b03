//! # marketplace-core: Pure Cart Logic for the GoMarketplace Storefront
//!
//! This crate holds the cart rules as pure functions with zero I/O
//! dependencies. The runtime that persists and shares the cart lives in
//! `marketplace-cart`; the key-value adapter lives in `marketplace-store`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GoMarketplace Cart Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront UI (consumers)                    │   │
//! │  │    Product list ──► Cart screen ──► Floating cart badge         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CartHandle                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                marketplace-cart (CartStore runtime)             │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────┐  ┌────────────▼────────────────┐  │
//! │  │   ★ marketplace-core ★          │  │     marketplace-store       │  │
//! │  │                                 │  │                             │  │
//! │  │  types  cart  codec  validation │  │  KeyValueStore (get / set)  │  │
//! │  │                                 │  │  MemoryStore, SqliteStore   │  │
//! │  │  NO I/O • PURE FUNCTIONS        │  │                             │  │
//! │  └─────────────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem` and `NewLineItem`
//! - [`cart`] - The `Cart` container and its add / increment / decrement rules
//! - [`codec`] - The persisted blob format and the storage key
//! - [`error`] - Domain error types
//! - [`validation`] - Field checks
//!
//! ## Example Usage
//!
//! ```rust
//! use marketplace_core::{codec, Cart, MalformedPolicy, NewLineItem};
//!
//! let mut cart = Cart::new();
//! cart.add(NewLineItem::new("a", "Shoe", "u", 10.0)).unwrap();
//! cart.add(NewLineItem::new("a", "Shoe", "u", 10.0)).unwrap();
//! assert_eq!(cart.get("a").unwrap().quantity, 2);
//!
//! let blob = codec::encode(&cart).unwrap();
//! let decoded = codec::decode(&blob, MalformedPolicy::DiscardBlob).unwrap();
//! assert_eq!(decoded.cart, cart);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod codec;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartChange, CartOp};
pub use codec::{storage_key, Decoded, MalformedPolicy, DEFAULT_NAMESPACE};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::{LineItem, NewLineItem};
