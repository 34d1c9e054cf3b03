//! # Cart Blob Codec
//!
//! Turns a [`Cart`] into the string stored under the cart key and back.
//!
//! ## Blob Format
//! ```text
//! key:   @GoMarketplace:products
//! value: [
//!          {"id":"a","title":"Shoe","image_url":"u","price":10.0,"quantity":1},
//!          {"id":"b","title":"Hat","image_url":"u2","price":5.0,"quantity":2}
//!        ]
//! ```
//! - JSON array, one object per line item, in cart order
//! - Field names are snake_case; `imageUrl` is read as an alias
//! - Unknown extra fields are ignored on read
//!
//! ## Decode Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        decode(blob, policy)                             │
//! │                                                                         │
//! │  not a JSON array ──────────────────────────► Err(MalformedCart)        │
//! │                                                                         │
//! │  for each entry:                                                        │
//! │    missing field / wrong type / quantity 0 / duplicate id               │
//! │       │                                                                 │
//! │       ├── DiscardBlob ──► Err(MalformedCart)   (caller starts empty)    │
//! │       └── DropEntries ──► skip entry, dropped += 1                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::LineItem;
use crate::validation::validate_line_item;

/// Namespace used by the storefront app for its local keys.
pub const DEFAULT_NAMESPACE: &str = "GoMarketplace";

/// Builds the key the cart blob lives under for a namespace.
///
/// ```rust
/// use marketplace_core::codec::{storage_key, DEFAULT_NAMESPACE};
///
/// assert_eq!(storage_key(DEFAULT_NAMESPACE), "@GoMarketplace:products");
/// ```
pub fn storage_key(namespace: &str) -> String {
    format!("@{}:products", namespace)
}

// =============================================================================
// Malformed Data Policy
// =============================================================================

/// What to do with a persisted blob that breaks the cart invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Reject the whole blob; hydration starts from an empty cart.
    #[default]
    DiscardBlob,

    /// Keep every valid entry and skip the rest.
    DropEntries,
}

impl std::fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedPolicy::DiscardBlob => write!(f, "discard_blob"),
            MalformedPolicy::DropEntries => write!(f, "drop_entries"),
        }
    }
}

impl std::str::FromStr for MalformedPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discard_blob" | "discard" => Ok(MalformedPolicy::DiscardBlob),
            "drop_entries" | "drop" => Ok(MalformedPolicy::DropEntries),
            _ => Err(CoreError::Validation(ValidationError::NotAllowed {
                field: "malformed_policy".to_string(),
                allowed: vec!["discard_blob".to_string(), "drop_entries".to_string()],
            })),
        }
    }
}

// =============================================================================
// Encode / Decode
// =============================================================================

/// Result of decoding a blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The cart rebuilt from the valid entries.
    pub cart: Cart,

    /// Number of entries skipped under [`MalformedPolicy::DropEntries`].
    pub dropped: usize,
}

/// Serializes the full ordered cart.
pub fn encode(cart: &Cart) -> CoreResult<String> {
    serde_json::to_string(cart).map_err(|e| CoreError::EncodeFailed(e.to_string()))
}

/// Parses a blob back into a cart, enforcing unique ids and positive
/// quantities.
pub fn decode(blob: &str, policy: MalformedPolicy) -> CoreResult<Decoded> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(blob)?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut items = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        match parse_entry(entry, &seen) {
            Ok(item) => {
                seen.insert(item.id.clone());
                items.push(item);
            }
            Err(reason) => match policy {
                MalformedPolicy::DiscardBlob => {
                    return Err(CoreError::MalformedCart(format!(
                        "entry {}: {}",
                        index, reason
                    )));
                }
                MalformedPolicy::DropEntries => dropped += 1,
            },
        }
    }

    Ok(Decoded {
        cart: Cart::from_valid_items(items),
        dropped,
    })
}

fn parse_entry(entry: serde_json::Value, seen: &HashSet<String>) -> CoreResult<LineItem> {
    let item: LineItem = serde_json::from_value(entry)?;
    validate_line_item(&item)?;

    if seen.contains(&item.id) {
        return Err(ValidationError::Duplicate {
            field: "id".to_string(),
            value: item.id,
        }
        .into());
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewLineItem;
    use proptest::prelude::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("GoMarketplace"), "@GoMarketplace:products");
        assert_eq!(storage_key("test"), "@test:products");
    }

    #[test]
    fn test_encode_empty_cart() {
        assert_eq!(encode(&Cart::new()).unwrap(), "[]");
    }

    #[test]
    fn test_decode_hydration_example() {
        let blob = r#"[{"id":"b","title":"Hat","imageUrl":"u2","price":5,"quantity":2}]"#;

        let decoded = decode(blob, MalformedPolicy::DiscardBlob).unwrap();

        assert_eq!(decoded.dropped, 0);
        assert_eq!(decoded.cart.len(), 1);
        let hat = decoded.cart.get("b").unwrap();
        assert_eq!(hat.title, "Hat");
        assert_eq!(hat.image_url, "u2");
        assert_eq!(hat.price, 5.0);
        assert_eq!(hat.quantity, 2);
    }

    #[test]
    fn test_blank_id_is_a_valid_line() {
        let blob = r#"[
            {"id":"b","title":"Hat","image_url":"u2","price":5,"quantity":2},
            {"id":" ","title":"Unnamed","image_url":"u","price":1,"quantity":1}
        ]"#;

        let decoded = decode(blob, MalformedPolicy::DiscardBlob).unwrap();
        assert_eq!(decoded.dropped, 0);
        assert_eq!(decoded.cart.len(), 2);
        assert_eq!(decoded.cart.get(" ").unwrap().quantity, 1);

        let blob = encode(&decoded.cart).unwrap();
        let again = decode(&blob, MalformedPolicy::DiscardBlob).unwrap();
        assert_eq!(again.cart, decoded.cart);
    }

    #[test]
    fn test_decode_round_trip_keeps_order() {
        let mut cart = Cart::new();
        cart.add(NewLineItem::new("z", "Zed", "z.png", 1.5)).unwrap();
        cart.add(NewLineItem::new("a", "Ay", "a.png", 2.25)).unwrap();
        cart.increment("z").unwrap();

        let decoded = decode(&encode(&cart).unwrap(), MalformedPolicy::DiscardBlob).unwrap();

        assert_eq!(decoded.cart, cart);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = decode(r#"{"id":"a"}"#, MalformedPolicy::DropEntries).unwrap_err();
        assert!(matches!(err, CoreError::MalformedCart(_)));

        let err = decode("not json", MalformedPolicy::DiscardBlob).unwrap_err();
        assert!(matches!(err, CoreError::MalformedCart(_)));
    }

    #[test]
    fn test_discard_policy_rejects_zero_quantity() {
        let blob = r#"[
            {"id":"a","title":"Shoe","image_url":"u","price":10,"quantity":1},
            {"id":"b","title":"Hat","image_url":"u2","price":5,"quantity":0}
        ]"#;

        let err = decode(blob, MalformedPolicy::DiscardBlob).unwrap_err();

        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_discard_policy_rejects_negative_quantity() {
        let blob = r#"[{"id":"a","title":"Shoe","image_url":"u","price":10,"quantity":-1}]"#;
        assert!(decode(blob, MalformedPolicy::DiscardBlob).is_err());
    }

    #[test]
    fn test_drop_policy_skips_bad_entries() {
        let blob = r#"[
            {"id":"a","title":"Shoe","image_url":"u","price":10,"quantity":1},
            {"id":"a","title":"Shoe again","image_url":"u","price":10,"quantity":4},
            {"id":"b","title":"Hat","price":5,"quantity":2},
            {"id":"d","title":"Free","image_url":"x","price":1,"quantity":0},
            {"id":"c","title":"Sock","image_url":"u3","price":2,"quantity":3}
        ]"#;

        let decoded = decode(blob, MalformedPolicy::DropEntries).unwrap();

        assert_eq!(decoded.dropped, 3);
        let ids: Vec<_> = decoded.cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(decoded.cart.get("a").unwrap().quantity, 1); // first one wins
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "discard_blob".parse::<MalformedPolicy>().unwrap(),
            MalformedPolicy::DiscardBlob
        );
        assert_eq!(
            "DROP".parse::<MalformedPolicy>().unwrap(),
            MalformedPolicy::DropEntries
        );
        assert!("keep".parse::<MalformedPolicy>().is_err());
    }

    fn line_strategy() -> impl Strategy<Value = NewLineItem> {
        (
            "[a-z0-9-]{1,12}",
            ".{0,20}",
            ".{0,20}",
            (0u32..100_000).prop_map(|cents| f64::from(cents) / 100.0),
        )
            .prop_map(|(id, title, image, price)| NewLineItem::new(id, title, image, price))
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            lines in prop::collection::vec(line_strategy(), 0..20),
            bumps in prop::collection::vec(0usize..20, 0..40),
        ) {
            let mut cart = Cart::new();
            for line in lines {
                cart.add(line).unwrap();
            }
            for bump in bumps {
                if let Some(id) = cart.items().get(bump).map(|i| i.id.clone()) {
                    cart.increment(&id).unwrap();
                }
            }

            let decoded = decode(&encode(&cart).unwrap(), MalformedPolicy::DiscardBlob).unwrap();

            prop_assert_eq!(decoded.dropped, 0);
            prop_assert_eq!(decoded.cart, cart);
        }
    }
}
