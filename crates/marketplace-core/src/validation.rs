//! # Validation Module
//!
//! Field checks applied to items entering the cart, either from a UI call
//! or from a persisted blob during hydration.
//!
//! Ids are opaque catalog strings and are not checked here; any string,
//! blank included, identifies a line.
//!
//! ## Usage
//! ```rust
//! use marketplace_core::validation::validate_line_item;
//! use marketplace_core::NewLineItem;
//!
//! let blank_id = NewLineItem::new(" ", "Shoe", "u", 10.0).with_quantity(1);
//! assert!(validate_line_item(&blank_id).is_ok());
//!
//! let item = NewLineItem::new("a", "Shoe", "u", 10.0).with_quantity(0);
//! assert!(validate_line_item(&item).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::LineItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a price.
///
/// The value is never recomputed, but a NaN or infinite price cannot be
/// written back as JSON, so it is refused at the door.
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity.
///
/// ## Rules
/// - Must be at least 1 for an item that is in the cart
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a complete line item.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_price(item.price)?;
    validate_quantity(item.quantity)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewLineItem;

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(19.99).is_ok());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_validate_line_item() {
        let ok = NewLineItem::new("a", "Shoe", "u", 10.0).with_quantity(2);
        assert!(validate_line_item(&ok).is_ok());

        let blank_id = NewLineItem::new("", "Shoe", "u", 10.0).with_quantity(2);
        assert!(validate_line_item(&blank_id).is_ok());

        let empty = NewLineItem::new("a", "Shoe", "u", 10.0).with_quantity(0);
        assert!(matches!(
            validate_line_item(&empty),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
