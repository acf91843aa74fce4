//! Session-owned shopping cart.
//!
//! A cart is a plain insertion-ordered collection of [`CartLine`]s with one
//! hard invariant: at most one line exists per `(product_id, color, size)`
//! key. Adding a line whose key is already present merges by adding
//! quantities; overwriting a quantity is a separate, explicit operation.
//!
//! The collection itself is IO-free. Durability is layered on top by
//! [`store::CartStore`], which serializes the whole cart after every
//! mutation through a [`storage::CartStorage`] backend.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod storage;
pub mod store;

pub use storage::{CartStorage, MemoryCartStorage, PgCartStorage};
pub use store::CartStore;

/// Upper bound on a single line's quantity. Merges and overwrites clamp
/// here, so quantity arithmetic can never overflow `u32`.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Identity of one purchasable configuration.
///
/// Two lines are the same line exactly when product, color and size all
/// match; quantity and the captured display fields never participate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineKey {
    pub product_id: Uuid,
    pub color: String,
    pub size: String,
}

impl LineKey {
    pub fn new(product_id: Uuid, color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product_id,
            color: color.into(),
            size: size.into(),
        }
    }
}

/// One purchase intent: a product variant plus quantity.
///
/// `unit_price`, `name` and `image` are denormalized copies captured when
/// the line is added; they are deliberately never re-fetched from the
/// catalog so the cart keeps showing what the customer put in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub name: String,
    pub image: Option<String>,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.color == key.color && self.size == key.size
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// The cart collection. Serializes transparently as a JSON array of lines,
/// which is also the shape persisted by the snapshot storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines. Recomputed, never cached.
    /// Saturates rather than overflowing; hydrated snapshots may carry
    /// quantities written before the per-line clamp existed.
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of `quantity * unit_price` across all lines, in minor units.
    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn find(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.matches(key))
    }

    /// Add a line. If a line with the same key exists its quantity is
    /// incremented by `line.quantity`; otherwise the line is appended.
    ///
    /// Callers validate `quantity >= 1` before calling. The resulting
    /// quantity clamps at [`MAX_LINE_QUANTITY`] either way.
    pub fn add(&mut self, mut line: CartLine) {
        let key = line.key();
        match self.lines.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(MAX_LINE_QUANTITY);
            }
            None => {
                line.quantity = line.quantity.min(MAX_LINE_QUANTITY);
                self.lines.push(line);
            }
        }
    }

    /// Overwrite the quantity of the line with this key. Returns `false`
    /// when no such line exists.
    ///
    /// Setting quantity to 0 keeps the line in the cart; removal is only
    /// ever performed by [`Cart::remove`]. Values above
    /// [`MAX_LINE_QUANTITY`] clamp to it.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        match self.lines.iter_mut().find(|line| line.matches(key)) {
            Some(line) => {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove the line with this key. Removing an absent key is a no-op,
    /// not an error; returns whether a line was actually removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(key));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
