//! # Cart
//!
//! The per-user cart document and its merge rules.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Client Action            Cart Method             Effect                │
//! │  ─────────────            ───────────             ──────                │
//! │                                                                         │
//! │  POST /cart ─────────────► add_item() ──────────► same key? qty += n   │
//! │                                                   else push line        │
//! │                                                                         │
//! │  POST /cart/sync ────────► sync() ──────────────► push lines whose key │
//! │                                                   is absent (no sums)   │
//! │                                                                         │
//! │  DELETE /cart/:id ───────► remove_item() ───────► drop line by row id  │
//! │                                                                         │
//! │  DELETE /cart ───────────► clear_items() ───────► items = [] only      │
//! │                                                                         │
//! │  POST /orders ───────────► reset() ─────────────► items = [],          │
//! │                                                   coupons = []          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Two lines are the same line when their [`LineKey`] is equal:
//! `(product_id, size, color)`. A cart never holds two lines with equal keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_attribute, validate_cart_size, validate_price_cents, validate_quantity};

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line: one design in one size and one color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: String,
    pub size: String,
    pub color: String,
}

impl LineKey {
    pub fn new(
        product_id: impl Into<String>,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        LineKey {
            product_id: product_id.into(),
            size: size.into(),
            color: color.into(),
        }
    }
}

// =============================================================================
// Price Snapshot
// =============================================================================

/// Display data frozen into a line when it is added.
///
/// Historical only: checkout re-reads the live product for stock, but the
/// amount charged comes from this snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub title: String,
    pub price_cents: i64,
    pub image: Option<String>,
}

impl PriceSnapshot {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A priced line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Row id (UUID), used by remove.
    pub id: String,
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub snapshot: PriceSnapshot,
}

impl CartItem {
    /// Turns a validated request line into a cart row with a fresh id.
    pub fn from_new(item: NewCartItem) -> Self {
        CartItem {
            id: Uuid::new_v4().to_string(),
            product_id: item.product_id,
            size: item.size,
            color: item.color,
            quantity: item.quantity,
            snapshot: item.snapshot,
        }
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(&self.product_id, &self.size, &self.color)
    }

    /// Returns `snapshot price × quantity`, saturating on overflow.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.snapshot.price().multiply_quantity(self.quantity)
    }

    /// Returns `snapshot price × quantity`, or `None` on overflow.
    #[inline]
    pub fn checked_line_total(&self) -> Option<Money> {
        self.snapshot.price().checked_mul_quantity(self.quantity)
    }
}

/// A line as submitted by a client, before it is merged into a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub snapshot: PriceSnapshot,
}

impl NewCartItem {
    pub fn key(&self) -> LineKey {
        LineKey::new(&self.product_id, &self.size, &self.color)
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity(self.quantity)?;
        validate_attribute("size", &self.size)?;
        validate_attribute("color", &self.color)?;
        validate_price_cents(self.snapshot.price_cents)?;
        Ok(())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One user's cart.
///
/// ## Concurrency
/// `version` is the optimistic concurrency token. The database layer only
/// writes a cart whose stored version still equals the version it was read
/// with, then bumps it; a mismatch means another request won the race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
    /// Coupon ids in the order they were applied.
    pub applied_coupons: Vec<String>,
    /// Cached result of the discount cascade; checkout recomputes it.
    pub total_discount_cents: i64,
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for `user_id`.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Cart {
            user_id: user_id.into(),
            items: Vec::new(),
            applied_coupons: Vec::new(),
            total_discount_cents: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of snapshot line totals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of snapshot line totals without any saturation.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` if a line total or the sum overflows
    pub fn checked_subtotal(&self) -> CoreResult<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, line| {
                line.checked_line_total().and_then(|total| acc.checked_add(total))
            })
            .ok_or_else(|| {
                ValidationError::OutOfRange {
                    field: "subtotal".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into()
            })
    }

    pub fn find_line(&self, key: &LineKey) -> Option<&CartItem> {
        self.items.iter().find(|line| line.key() == *key)
    }

    /// Adds a line, summing quantities into an existing line with the same key.
    ///
    /// The existing line keeps its original snapshot.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` if the item is invalid, the merged quantity
    ///   exceeds the per-line maximum, the cart is full, or the subtotal
    ///   would overflow
    pub fn add_item(&mut self, item: NewCartItem) -> CoreResult<&CartItem> {
        item.validate()?;

        let key = item.key();
        if let Some(pos) = self.items.iter().position(|line| line.key() == key) {
            let previous = self.items[pos].quantity;
            let merged = previous + item.quantity;
            validate_quantity(merged)?;
            self.items[pos].quantity = merged;
            if let Err(e) = self.checked_subtotal() {
                self.items[pos].quantity = previous;
                return Err(e);
            }
            return Ok(&self.items[pos]);
        }

        validate_cart_size(self.items.len())?;
        self.items.push(CartItem::from_new(item));
        if let Err(e) = self.checked_subtotal() {
            self.items.pop();
            return Err(e);
        }
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    /// Merges an offline cart.
    ///
    /// Only lines whose key is absent are appended; a matching line keeps its
    /// own quantity. Invalid lines and lines past the cart limit are skipped.
    /// Returns the number of lines appended.
    pub fn sync(&mut self, local_items: Vec<NewCartItem>) -> usize {
        let mut added = 0;

        for item in local_items {
            if item.validate().is_err() {
                continue;
            }
            if self.find_line(&item.key()).is_some() {
                continue;
            }
            if validate_cart_size(self.items.len()).is_err() {
                break;
            }
            self.items.push(CartItem::from_new(item));
            if self.checked_subtotal().is_err() {
                self.items.pop();
                continue;
            }
            added += 1;
        }

        added
    }

    /// Removes the line with row id `item_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id != item_id);
        self.items.len() != before
    }

    /// Empties the items. Applied coupons stay.
    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    pub fn has_coupon(&self, coupon_id: &str) -> bool {
        self.applied_coupons.iter().any(|id| id == coupon_id)
    }

    /// Appends a coupon id.
    ///
    /// ## Errors
    /// - `COUPON_ALREADY_APPLIED` if the id is already present
    pub fn apply_coupon(&mut self, coupon_id: &str, code: &str) -> CoreResult<()> {
        if self.has_coupon(coupon_id) {
            return Err(CoreError::CouponAlreadyApplied(code.to_string()));
        }
        self.applied_coupons.push(coupon_id.to_string());
        Ok(())
    }

    /// Removes a coupon id if present. Returns whether it was present.
    pub fn remove_coupon(&mut self, coupon_id: &str) -> bool {
        let before = self.applied_coupons.len();
        self.applied_coupons.retain(|id| id != coupon_id);
        self.applied_coupons.len() != before
    }

    /// Post-checkout reset: items, coupons and the cached discount are cleared.
    pub fn reset(&mut self) {
        self.items.clear();
        self.applied_coupons.clear();
        self.total_discount_cents = 0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
