//! # Cart & Receipt
//!
//! The in-memory order being built at the register, and the receipt
//! produced when it completes.
//!
//! ## Price Freezing
//! A cart line snapshots the product's name, category and price at the
//! moment it is added. If a manager edits the product while the customer
//! is at the counter, the cart keeps charging what the screen showed.
//!
//! ## Invariants
//! - Lines are unique by `product_id` (re-adding merges quantities)
//! - Quantities are strictly positive
//! - Line count and per-line quantity are capped (see crate constants)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// One line of a cart: a product snapshot plus a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Durable id of the product (for recipe lookup at completion).
    pub product_id: String,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Category at time of adding (frozen).
    pub category: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    pub quantity: i64,

    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a line from a product, freezing its sale-relevant fields.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The order being assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product, merging with an existing line for the same product.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Removes the line for a product, if present.
    pub fn remove_product(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// True when the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Order total across all lines.
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total())
    }
}

/// The result of a completed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// The lines as sold (snapshots, not live product rows).
    pub lines: Vec<CartLine>,

    pub total_cents: i64,
    pub cash_received_cents: i64,

    /// Never negative: payment sufficiency is checked before completion.
    pub change_cents: i64,

    /// Shared timestamp stamped on every sales record of this order.
    pub completed_at: DateTime<Utc>,
}

impl Receipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}
