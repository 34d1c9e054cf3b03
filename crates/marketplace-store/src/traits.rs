//! The key-value adapter seam.
//!
//! The cart depends on this capability only; it never manages the store's
//! lifecycle. Implementations: [`crate::SqliteStore`] (durable) and
//! [`crate::MemoryStore`] (tests, ephemeral sessions).

use async_trait::async_trait;

use crate::error::StoreResult;

/// Async get/set of string blobs by key.
///
/// # Contract
///
/// - `get` of a key that was never set returns `Ok(None)`, not an error.
/// - `set` overwrites any previous value for the key.
/// - Neither call is retried by the store; callers decide what a failure means.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}
