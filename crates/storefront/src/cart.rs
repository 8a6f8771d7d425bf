//! Shared shopping cart.
//!
//! One [`CartStore`] is shared by the navbar badge, the cart drawer and the
//! purchase form. All mutation goes through the store's methods, which apply
//! in call order; dependents either read on render or [`CartStore::subscribe`]
//! for change notifications.
//!
//! Totals are never stored. [`badge_count`] and [`subtotal`] are recomputed
//! from the lines on every read.

use std::sync::Arc;

use giftify_core::{CurrencyCode, Price, Product, ProductId, Quantity};
use tokio::sync::watch;
use tracing::debug;

/// One aggregated product/quantity pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// The product, as it was when added.
    pub product: Product,
    /// Units of the product; at least one.
    pub quantity: Quantity,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.unit_price().times(self.quantity)
    }
}

/// Shared cart store.
///
/// Cheap to clone; clones share the same lines.
#[derive(Debug, Clone)]
pub struct CartStore {
    lines: Arc<watch::Sender<Vec<CartLine>>>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (lines, _) = watch::channel(Vec::new());
        Self {
            lines: Arc::new(lines),
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// A product already in the cart gains units on its existing line.
    pub fn add(&self, product: Product, quantity: Quantity) {
        self.lines.send_modify(|lines| {
            if let Some(line) = lines.iter_mut().find(|l| l.product.id == product.id) {
                line.quantity = line.quantity.saturating_add(quantity);
                debug!(product_id = %product.id, quantity = %line.quantity, "Cart line increased");
            } else {
                debug!(product_id = %product.id, %quantity, "Cart line added");
                lines.push(CartLine { product, quantity });
            }
        });
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&self, product_id: &ProductId) -> bool {
        self.lines.send_if_modified(|lines| {
            let before = lines.len();
            lines.retain(|l| &l.product.id != product_id);
            let removed = lines.len() != before;
            if removed {
                debug!(%product_id, "Cart line removed");
            }
            removed
        })
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// Returns whether the cart changed.
    pub fn set_quantity(&self, product_id: &ProductId, count: u32) -> bool {
        let Ok(quantity) = Quantity::new(count) else {
            return self.remove(product_id);
        };
        self.lines.send_if_modified(|lines| {
            match lines.iter_mut().find(|l| &l.product.id == product_id) {
                Some(line) if line.quantity != quantity => {
                    line.quantity = quantity;
                    debug!(%product_id, %quantity, "Cart line quantity set");
                    true
                }
                _ => false,
            }
        })
    }

    /// Remove every line.
    pub fn clear(&self) {
        self.lines.send_if_modified(|lines| {
            let had_lines = !lines.is_empty();
            lines.clear();
            had_lines
        });
    }

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.borrow().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn badge_count(&self) -> u32 {
        badge_count(&self.lines.borrow())
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        subtotal(&self.lines.borrow())
    }

    /// Receive the lines after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartLine>> {
        self.lines.subscribe()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Total units across `lines`, saturating at `u32::MAX`.
#[must_use]
pub fn badge_count(lines: &[CartLine]) -> u32 {
    lines
        .iter()
        .fold(0_u32, |total, line| total.saturating_add(line.quantity.get()))
}

/// Sum of line totals in the store currency.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Price {
    let amount = lines.iter().map(|l| l.line_total().amount).sum();
    Price::new(amount, CurrencyCode::USD)
}
