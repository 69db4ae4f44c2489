//! Client-side shopping cart.
//!
//! [`CartStore`] is an owned value: the UI layer holds it and mutates it
//! through `&mut self`, so there is exactly one writer. Lines keep the
//! product record they were created from; its stock level is the cap for
//! the line's quantity and the base for the checkout stock update.
//!
//! The only consistency rule applied against the backend is
//! [`CartStore::reconcile_with_catalog`], which drops lines whose product
//! no longer exists.

mod checkout;

pub use checkout::{
    CheckoutBackend, CheckoutError, CheckoutOptions, CheckoutPhase, CheckoutReceipt,
    CheckoutResult,
};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use nexuskart_core::{Money, ProductId};

use crate::models::{Product, ValidationError};

/// Errors from local cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The line is already at the product's stock level.
    #[error("Cannot add more than available stock ({available} left of {name})")]
    StockExhausted {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    /// The product is marked unavailable or has no stock.
    #[error("{name} is out of stock")]
    Unavailable { product_id: ProductId, name: String },

    /// The product record is missing required fields.
    #[error("Product {product_id} cannot be added: {source}")]
    InvalidProduct {
        product_id: ProductId,
        #[source]
        source: ValidationError,
    },
}

// =============================================================================
// CartLine
// =============================================================================

/// One product in the cart and how many of it.
///
/// Invariant: `1 <= quantity <= stock_at_fetch()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    product: Product,
    quantity: u32,
    #[serde(default)]
    image_ref: Option<String>,
}

impl CartLine {
    /// A new line with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidProduct` if the record fails validation, or
    /// `CartError::Unavailable` if it cannot be bought.
    pub fn from_product(product: &Product) -> Result<Self, CartError> {
        check_purchasable(product)?;
        Ok(Self {
            product: product.clone(),
            quantity: 1,
            image_ref: product.image_name.clone(),
        })
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.product.name
    }

    #[must_use]
    pub fn brand(&self) -> &str {
        &self.product.brand
    }

    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.product.price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Stock level of the product when it was last fetched.
    #[must_use]
    pub const fn stock_at_fetch(&self) -> u32 {
        self.product.stock_quantity
    }

    /// The stored image file name, if the product has one.
    #[must_use]
    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    /// The product record this line was built from.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price.times(self.quantity)
    }

    /// Take a fresher record of the same product, clamping the quantity if
    /// stock has dropped.
    fn refresh(&mut self, product: &Product) -> Result<(), CartError> {
        check_purchasable(product)?;
        self.product = product.clone();
        if product.image_name.is_some() {
            self.image_ref.clone_from(&product.image_name);
        }
        self.quantity = self.quantity.min(self.stock_at_fetch());
        Ok(())
    }
}

fn check_purchasable(product: &Product) -> Result<(), CartError> {
    product
        .validate()
        .map_err(|source| CartError::InvalidProduct {
            product_id: product.id,
            source,
        })?;
    if !product.in_stock() {
        return Err(CartError::Unavailable {
            product_id: product.id,
            name: product.name.clone(),
        });
    }
    Ok(())
}

/// Result of [`CartStore::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    /// Quantity after clamping.
    pub quantity: u32,
    /// Whether the requested quantity was outside `[1, stock]`.
    pub clamped: bool,
}

// =============================================================================
// Snapshots
// =============================================================================

/// An ordered copy of the cart's lines, as persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl CartSnapshot {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// The product ids that exist in the backend right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    ids: HashSet<ProductId>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        products.iter().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ProductId> for CatalogSnapshot {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The cart of the current session.
#[derive(Debug, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
    phase: CheckoutPhase,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from a persisted snapshot.
    ///
    /// Lines that no longer satisfy the quantity invariant are clamped,
    /// lines with no stock are dropped, and duplicate products keep only
    /// their first line.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        let mut seen = HashSet::new();
        let lines = snapshot
            .lines
            .into_iter()
            .filter(|line| line.stock_at_fetch() > 0 && seen.insert(line.product_id()))
            .map(|mut line| {
                line.quantity = line.quantity.clamp(1, line.stock_at_fetch());
                line
            })
            .collect();

        Self {
            lines,
            phase: CheckoutPhase::Idle,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
        }
    }

    /// Add one unit of `product`.
    ///
    /// A new line starts at quantity 1. An existing line takes the fresher
    /// product record and goes up by one, capped at its stock. Returns the
    /// line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StockExhausted` when the line is already at the
    /// stock level, or a validation error if the product cannot be bought.
    /// The cart is left consistent in every case.
    #[instrument(level = "debug", skip(self, product), fields(product_id = %product.id))]
    pub fn add(&mut self, product: &Product) -> Result<u32, CartError> {
        self.phase = CheckoutPhase::Idle;

        if let Some(line) = self.line_mut(product.id) {
            line.refresh(product)?;
            if line.quantity >= line.stock_at_fetch() {
                return Err(CartError::StockExhausted {
                    product_id: product.id,
                    name: product.name.clone(),
                    available: line.stock_at_fetch(),
                });
            }
            line.quantity += 1;
            debug!(quantity = line.quantity, "Incremented cart line");
            return Ok(line.quantity);
        }

        self.lines.push(CartLine::from_product(product)?);
        debug!("Added cart line");
        Ok(1)
    }

    /// Change a line's quantity by `delta`, clamped to `[1, stock]`.
    ///
    /// Returns `None` if the product is not in the cart.
    #[instrument(level = "debug", skip(self), fields(product_id = %id))]
    pub fn set_quantity(&mut self, id: ProductId, delta: i64) -> Option<QuantityChange> {
        self.phase = CheckoutPhase::Idle;

        let line = self.line_mut(id)?;
        let max = i64::from(line.stock_at_fetch().max(1));
        let requested = i64::from(line.quantity).saturating_add(delta);
        let clamped = requested.clamp(1, max);
        line.quantity = u32::try_from(clamped).unwrap_or(1);

        debug!(requested, quantity = line.quantity, "Set cart quantity");
        Some(QuantityChange {
            quantity: line.quantity,
            clamped: clamped != requested,
        })
    }

    /// Delete a line. Absent products are a no-op.
    #[instrument(level = "debug", skip(self), fields(product_id = %id))]
    pub fn remove(&mut self, id: ProductId) -> Option<CartLine> {
        self.phase = CheckoutPhase::Idle;
        let index = self.lines.iter().position(|l| l.product_id() == id)?;
        Some(self.lines.remove(index))
    }

    /// Drop every line whose product is not in `catalog`. Returns the
    /// dropped lines in cart order.
    #[instrument(skip(self, catalog), fields(catalog = catalog.len()))]
    pub fn reconcile_with_catalog(&mut self, catalog: &CatalogSnapshot) -> Vec<CartLine> {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.lines)
            .into_iter()
            .partition(|line| catalog.contains(line.product_id()));
        self.lines = kept;

        for line in &dropped {
            warn!(product_id = %line.product_id(), name = %line.name(), "Dropped deleted product from cart");
        }
        dropped
    }

    /// `Σ unit_price × quantity` over the current lines.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(CartLine::quantity).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.phase = CheckoutPhase::Idle;
    }

    /// Where the last checkout attempt ended.
    #[must_use]
    pub const fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id() == id)
    }
}
