//! # Domain Types
//!
//! The line item shapes shared by the cart, the persisted blob and the UI.
//!
//! ## Type Relationship
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Line Item Types                                 │
//! │                                                                         │
//! │  ┌─────────────────┐   add_to_cart()   ┌─────────────────┐              │
//! │  │  NewLineItem    │ ────────────────► │    LineItem     │              │
//! │  │  ─────────────  │   quantity = 1    │  ─────────────  │              │
//! │  │  id             │                   │  id             │              │
//! │  │  title          │                   │  title          │              │
//! │  │  image_url      │                   │  image_url      │              │
//! │  │  price          │                   │  price          │              │
//! │  └─────────────────┘                   │  quantity ◄─────┼── only field │
//! │                                        └─────────────────┘   mutated    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Field Naming
//! Field names are fixed to snake_case on the wire (`image_url`). Blobs
//! written by older app builds that used `imageUrl` are still accepted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// New Line Item
// =============================================================================

/// A product the user asked to add, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    /// Opaque product identifier. The only equality key in the cart.
    pub id: String,

    /// Display name.
    pub title: String,

    /// Display image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,

    /// Unit price as shown in the catalog. Never recomputed here.
    pub price: f64,
}

impl NewLineItem {
    /// Creates a new line item request.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        NewLineItem {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Turns the request into a cart line with the given quantity.
    pub fn with_quantity(self, quantity: u32) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// ## Invariants
/// - `quantity >= 1` while the item is in a cart
/// - `id`, `title`, `image_url` and `price` never change after insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Opaque product identifier, stable across sessions.
    pub id: String,

    /// Display name (frozen at add time).
    pub title: String,

    /// Display image reference (frozen at add time).
    #[serde(alias = "imageUrl")]
    pub image_url: String,

    /// Unit price (frozen at add time).
    pub price: f64,

    /// Number of units selected.
    pub quantity: u32,
}

impl LineItem {
    /// Returns true if this line refers to the given product id.
    #[inline]
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_quantity_keeps_fields() {
        let item = NewLineItem::new("a", "Shoe", "u", 10.0).with_quantity(1);

        assert_eq!(item.id, "a");
        assert_eq!(item.title, "Shoe");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, 10.0);
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_camel_case_image_url_is_accepted() {
        let json = r#"{"id":"b","title":"Hat","imageUrl":"u2","price":5,"quantity":2}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.image_url, "u2");
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_serializes_snake_case() {
        let item = NewLineItem::new("a", "Shoe", "u", 10.0).with_quantity(3);
        let json = serde_json::to_string(&item).unwrap();

        assert!(json.contains("\"image_url\":\"u\""));
        assert!(!json.contains("imageUrl"));
    }
}
