//! # Cart
//!
//! The pending sale, built up line by line as the operator scans products.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Operations                                  │
//! │                                                                         │
//! │  Operator Action        Cart Method            State Change             │
//! │  ───────────────        ───────────            ────────────             │
//! │                                                                         │
//! │  Scan / enter qty ────► add_item() ──────────► merge or push line       │
//! │                                                 push undo entry         │
//! │                                                                         │
//! │  Undo ────────────────► undo_last() ─────────► pop entry                │
//! │                                                 decrement / drop line   │
//! │                                                                         │
//! │  Edit quantity ───────► update_quantity() ───► line.qty = max(n, 1)     │
//! │                                                                         │
//! │  Remove ──────────────► remove_line() ───────► drop line + its history  │
//! │                                                                         │
//! │  Checkout succeeded ──► clear() ─────────────► empty lines + history    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per barcode (additions merge)
//! - Every line has quantity ≥ 1
//! - Unit price is frozen when the line is created
//! - `total()` is recomputed on every call
//!
//! The cart never touches storage. The caller looks the product up and passes
//! it in; checkout re-validates stock against the database.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{normalize_barcode, validate_quantity};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Normalised barcode.
    pub barcode: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Price in minor units at time of adding (frozen).
    pub unit_price_cents: i64,

    pub quantity: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            barcode: normalize_barcode(&product.barcode),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// unit price × quantity
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A recorded addition, popped by [`Cart::undo_last`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub barcode: String,
    pub name: String,
    pub quantity: i64,
}

/// Read-only display row, recomputed from the cart after each mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRow {
    /// 1-based position in the cart.
    pub position: usize,
    pub barcode: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart with LIFO undo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    history: Vec<CartEntry>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` units of `product`.
    ///
    /// ## Checks (in order)
    /// 1. `quantity` is between 1 and [`MAX_ITEM_QUANTITY`]
    /// 2. product has stock at all (`OutOfStock`)
    /// 3. stock covers this request (`InsufficientStock`)
    /// 4. a new line does not exceed [`MAX_CART_LINES`]
    ///
    /// The stock check is against this request alone; checkout re-validates
    /// the merged quantity inside the database transaction.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let barcode = normalize_barcode(&product.barcode);

        if product.quantity <= 0 {
            return Err(CoreError::OutOfStock {
                barcode,
                name: product.name.clone(),
            });
        }

        if product.quantity < quantity {
            return Err(CoreError::InsufficientStock {
                barcode,
                name: product.name.clone(),
                available: product.quantity,
                requested: quantity,
            });
        }

        match self.lines.iter_mut().find(|l| l.barcode == barcode) {
            Some(line) => line.quantity += quantity,
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        self.history.push(CartEntry {
            barcode,
            name: product.name.clone(),
            quantity,
        });

        Ok(())
    }

    /// Reverses the most recent [`add_item`](Self::add_item).
    ///
    /// Returns the undone entry so the register can report it.
    pub fn undo_last(&mut self) -> CoreResult<CartEntry> {
        let entry = self.history.pop().ok_or(CoreError::NothingToUndo)?;

        if let Some(pos) = self.lines.iter().position(|l| l.barcode == entry.barcode) {
            let line = &mut self.lines[pos];
            line.quantity -= entry.quantity;
            if line.quantity <= 0 {
                self.lines.remove(pos);
            }
        }

        Ok(entry)
    }

    /// Sets a line's quantity. Values below 1 are clamped to 1.
    ///
    /// Earlier additions of this barcode are dropped from the undo history,
    /// since the edit replaces what they added.
    pub fn update_quantity(&mut self, barcode: &str, quantity: i64) -> CoreResult<()> {
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let barcode = normalize_barcode(barcode);
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.barcode == barcode)
            .ok_or_else(|| CoreError::ProductNotFound(barcode.clone()))?;

        line.quantity = quantity.max(1);
        self.history.retain(|e| e.barcode != barcode);
        Ok(())
    }

    /// Removes a line and its undo history.
    pub fn remove_line(&mut self, barcode: &str) -> CoreResult<CartLine> {
        let barcode = normalize_barcode(barcode);
        let pos = self
            .lines
            .iter()
            .position(|l| l.barcode == barcode)
            .ok_or_else(|| CoreError::ProductNotFound(barcode.clone()))?;

        self.history.retain(|e| e.barcode != barcode);
        Ok(self.lines.remove(pos))
    }

    /// Empties lines and undo history.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.history.clear();
    }

    /// Σ line subtotals.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, barcode: &str) -> Option<&CartLine> {
        let barcode = normalize_barcode(barcode);
        self.lines.iter().find(|l| l.barcode == barcode)
    }

    /// Display projection of the current lines.
    pub fn rows(&self) -> Vec<CartRow> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| CartRow {
                position: i + 1,
                barcode: line.barcode.clone(),
                name: line.name.clone(),
                unit_price: line.unit_price(),
                quantity: line.quantity,
                subtotal: line.subtotal(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }
}

/// Cart totals summary for the register display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
