//! # Cart Error Types
//!
//! Errors surfaced to cart consumers.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Usage          │  │   Persistence   │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotProvided    │  │  Store          │  │  InvalidConfig          │ │
//! │  │  Closed         │  │  PersistenceWrite│ │  ConfigLoadFailed       │ │
//! │  │                 │  │  FlushTimeout   │  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Usage errors are programming mistakes and are returned immediately.   │
//! │  Persistence errors never roll back the in-memory cart.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use marketplace_core::CoreError;
use marketplace_store::StoreError;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Cart error type.
#[derive(Debug, Error)]
pub enum CartError {
    // =========================================================================
    // Usage Errors
    // =========================================================================
    /// The cart was requested from a context nobody provided a store to.
    #[error("use_cart must be used within an initialized cart store")]
    NotProvided,

    /// The owning cart store has been shut down or dropped.
    #[error("Cart store has been shut down")]
    Closed,

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// A cart rule rejected the operation (validation, overflow, bad blob).
    #[error("Cart error: {0}")]
    Core(#[from] CoreError),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The key-value adapter failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Writing a cart revision to the store failed. The in-memory cart keeps it.
    #[error("Failed to persist cart revision {revision}: {message}")]
    PersistenceWrite { revision: u64, message: String },

    /// Waiting for the writer to catch up took too long.
    #[error("Cart flush did not finish within {0} ms")]
    FlushTimeout(u64),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid cart configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl CartError {
    /// Returns true if the caller used the cart outside a live store.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, CartError::NotProvided | CartError::Closed)
    }

    /// Returns true if this error came from the persistence side channel.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            CartError::Store(_) | CartError::PersistenceWrite { .. } | CartError::FlushTimeout(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CartError::InvalidConfig(_)
                | CartError::ConfigLoadFailed(_)
                | CartError::ConfigSaveFailed(_)
        )
    }
}
