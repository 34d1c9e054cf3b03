//! # marketplace-store: Persistent Store Adapter
//!
//! The key-value durability collaborator used by the cart to survive app
//! restarts. The cart only ever calls `get` and `set` on one namespaced key;
//! everything about where the bytes live is decided here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Persistence Path                           │
//! │                                                                         │
//! │  CartStore (marketplace-cart)                                          │
//! │       │  hydration: get(key)        writer task: set(key, blob)        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               marketplace-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────────┐   ┌──────────────────┐  ┌─────────────┐ │   │
//! │  │   │ KeyValueStore    │   │ SqliteStore      │  │ MemoryStore │ │   │
//! │  │   │ (traits.rs)      │◄──│ (sqlite.rs)      │  │ (memory.rs) │ │   │
//! │  │   │ get / set        │   │ WAL, kv_store    │  │ tests       │ │   │
//! │  │   └──────────────────┘   └──────────────────┘  └─────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marketplace_store::{KeyValueStore, SqliteStore, StoreConfig};
//!
//! let store = SqliteStore::open(StoreConfig::new("cart.db")).await?;
//! store.set("@GoMarketplace:products", "[]").await?;
//! let blob = store.get("@GoMarketplace:products").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod traits;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};
pub use traits::KeyValueStore;
