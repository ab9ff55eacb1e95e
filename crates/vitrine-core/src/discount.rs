//! # Discount Calculator
//!
//! Turns cart lines and applied coupons into `(subtotal, discount, final)`.
//!
//! ## The Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ snapshot.price × quantity            e.g. 200.00          │
//! │  remaining = subtotal                                                   │
//! │                                                                         │
//! │  for coupon in applied order:                                           │
//! │    skip if inactive / expired / min_purchase > subtotal                │
//! │    delta = remaining × pct   (percentage)          A: 10%  → 20.00      │
//! │          | value             (fixed)               B: 50   → 50.00      │
//! │    delta = min(delta, remaining)                                        │
//! │    discount += delta; remaining -= delta           remaining: 130.00    │
//! │                                                                         │
//! │  final = subtotal − discount                       discount 70, final 130│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `min_purchase` is compared with the ORIGINAL subtotal, so a second coupon
//! is never blocked because an earlier one lowered the running total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::coupon::Coupon;
use crate::money::Money;

/// Result of the cascade. `final_amount = subtotal − discount`, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub final_amount: Money,
}

/// Runs the discount cascade. Pure: same inputs, same output.
///
/// ## Example
/// ```rust
/// use vitrine_core::discount::compute;
///
/// let breakdown = compute(&[], &[], chrono::Utc::now());
/// assert!(breakdown.subtotal.is_zero());
/// assert!(breakdown.final_amount.is_zero());
/// ```
pub fn compute(items: &[CartItem], coupons: &[Coupon], now: DateTime<Utc>) -> DiscountBreakdown {
    let subtotal: Money = items.iter().map(CartItem::line_total).sum();

    let mut discount = Money::zero();
    let mut remaining = subtotal;

    for coupon in coupons {
        if !coupon.applies_to(subtotal, now) {
            continue;
        }

        let delta = coupon.reduction(remaining).min(remaining);
        discount += delta;
        remaining -= delta;
    }

    DiscountBreakdown {
        subtotal,
        discount,
        final_amount: subtotal - discount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
