//! # Error Types
//!
//! Domain-specific error types for marketplace-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  marketplace-core errors (this file)                                   │
//! │  ├── CoreError        - Cart rule and blob codec failures              │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  marketplace-store errors (separate crate)                             │
//! │  └── StoreError       - Key-value adapter failures                     │
//! │                                                                         │
//! │  marketplace-cart errors (separate crate)                              │
//! │  └── CartError        - What cart consumers see                        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → Consumer              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule and codec errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The persisted cart blob could not be turned back into a cart.
    ///
    /// ## When This Occurs
    /// - The blob is not a JSON array
    /// - An entry is missing a field or has the wrong type
    /// - An entry has `quantity` 0 or a duplicate `id`
    #[error("Malformed cart data: {0}")]
    MalformedCart(String),

    /// The cart could not be encoded.
    #[error("Failed to encode cart: {0}")]
    EncodeFailed(String),

    /// Incrementing would overflow the quantity counter.
    #[error("Quantity for {id} cannot grow past {max}")]
    QuantityOverflow { id: String, max: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::MalformedCart(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is not a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value where uniqueness is required.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityOverflow {
            id: "a".to_string(),
            max: u32::MAX,
        };
        assert_eq!(err.to_string(), "Quantity for a cannot grow past 4294967295");

        let err = ValidationError::Duplicate {
            field: "id".to_string(),
            value: "a".to_string(),
        };
        assert_eq!(err.to_string(), "id 'a' appears more than once");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_json_error_is_malformed_cart() {
        let json_err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let core_err: CoreError = json_err.into();
        assert!(matches!(core_err, CoreError::MalformedCart(_)));
    }
}
