//! # Cart
//!
//! The ordered, id-keyed collection of line items and the three operations
//! that mutate it.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  add(item)                                                              │
//! │    ├── id present  ──► quantity += 1            (merge, never dup)      │
//! │    └── id absent   ──► push(item, quantity = 1) (append at the end)     │
//! │                                                                         │
//! │  increment(id)                                                          │
//! │    ├── id present  ──► quantity += 1                                    │
//! │    └── id absent   ──► no-op                                            │
//! │                                                                         │
//! │  decrement(id)                                                          │
//! │    ├── quantity > 1 ─► quantity -= 1                                    │
//! │    ├── quantity = 1 ─► remove line          (no zero quantities)        │
//! │    └── id absent   ──► no-op                                            │
//! │                                                                         │
//! │  Order of the remaining lines never changes.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{LineItem, NewLineItem};
use crate::validation::validate_price;

// =============================================================================
// Change Reporting
// =============================================================================

/// What a single operation did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Inserted,

    /// An existing line now has this quantity.
    Updated { quantity: u32 },

    /// A line was removed after its quantity reached zero.
    Removed,

    /// The id was not in the cart; nothing happened.
    Unchanged,
}

impl CartChange {
    /// Returns true if the cart contents differ after the operation.
    pub fn is_modified(&self) -> bool {
        !matches!(self, CartChange::Unchanged)
    }
}

/// A cart mutation as data.
///
/// Used to record operations that must be replayed on top of another cart
/// (for example when a persisted cart arrives after the user already acted).
#[derive(Debug, Clone, PartialEq)]
pub enum CartOp {
    Add(NewLineItem),
    Increment(String),
    Decrement(String),
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same product increases quantity)
/// - Every quantity is >= 1 (decrementing the last unit removes the line)
/// - Lines keep their first-insertion order
///
/// Reading a cart back from text goes through [`crate::codec::decode`],
/// which enforces the invariants, so only `Serialize` is derived here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from lines that already satisfy the invariants.
    ///
    /// Only the codec calls this, after validating every entry.
    pub(crate) fn from_valid_items(items: Vec<LineItem>) -> Self {
        Cart { items }
    }

    /// Adds a product or merges it into the existing line.
    ///
    /// ## Behavior
    /// - If the id is already in the cart: same as [`Cart::increment`]
    /// - Otherwise: appends a line with quantity 1, other fields as given
    pub fn add(&mut self, item: NewLineItem) -> CoreResult<CartChange> {
        validate_price(item.price)?;

        if self.position(&item.id).is_some() {
            return self.increment(&item.id);
        }

        self.items.push(item.with_quantity(1));
        Ok(CartChange::Inserted)
    }

    /// Increases the quantity of a line by one. Unknown ids are a no-op.
    pub fn increment(&mut self, id: &str) -> CoreResult<CartChange> {
        let Some(item) = self.items.iter_mut().find(|i| i.is(id)) else {
            return Ok(CartChange::Unchanged);
        };

        item.quantity = item
            .quantity
            .checked_add(1)
            .ok_or_else(|| CoreError::QuantityOverflow {
                id: id.to_string(),
                max: u32::MAX,
            })?;

        Ok(CartChange::Updated {
            quantity: item.quantity,
        })
    }

    /// Decreases the quantity of a line by one, removing it at zero.
    /// Unknown ids are a no-op.
    pub fn decrement(&mut self, id: &str) -> CartChange {
        let Some(index) = self.position(id) else {
            return CartChange::Unchanged;
        };

        let item = &mut self.items[index];
        if item.quantity <= 1 {
            // Vec::remove keeps the relative order of the other lines
            self.items.remove(index);
            return CartChange::Removed;
        }

        item.quantity -= 1;
        CartChange::Updated {
            quantity: item.quantity,
        }
    }

    /// Applies a recorded operation.
    pub fn apply(&mut self, op: &CartOp) -> CoreResult<CartChange> {
        match op {
            CartOp::Add(item) => self.add(item.clone()),
            CartOp::Increment(id) => self.increment(id),
            CartOp::Decrement(id) => Ok(self.decrement(id)),
        }
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consumes the cart, returning its lines.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Looks up a line by product id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.is(id))
    }

    /// Returns the number of distinct products in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.is(id))
    }
}
