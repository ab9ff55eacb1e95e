//! # vitrine-core: Pure Business Logic for Vitrine
//!
//! This crate holds the rules of the cart-to-order pipeline as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    /cart ──► /coupons/apply ──► /orders ──► /orders/:id        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ services                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │   cart   │  │  coupon  │  │ discount │  │    order     │  │   │
//! │  │   │ LineKey  │  │ Coupon   │  │ compute  │  │ Order        │  │   │
//! │  │   │ merge    │  │ rules    │  │ cascade  │  │ snapshots    │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  vitrine-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, atomic conditional updates  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog types (Product, Percentage, UserRole)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart, line keys and the merge rules
//! - [`coupon`] - Coupon records and redemption eligibility
//! - [`discount`] - The discount cascade
//! - [`order`] - Order records built from a cart
//! - [`error`] - Domain error types with stable machine codes
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use vitrine_core::money::Money;
//! use vitrine_core::types::Percentage;
//!
//! let subtotal = Money::from_cents(20000); // $200.00
//! let ten_percent = Percentage::from_bps(1000);
//!
//! assert_eq!(subtotal.percent_of(ten_percent).cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, LineKey, NewCartItem, PriceSnapshot};
pub use coupon::{Coupon, DiscountType, NewCoupon};
pub use discount::DiscountBreakdown;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Order, OrderItem, OrderStatus, PaymentInfo, ShippingAddress};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted price in cents ($1,000,000).
///
/// With the quantity and line caps this keeps every cart subtotal far
/// inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Usage limit given to coupons created without one.
pub const DEFAULT_USAGE_LIMIT: i64 = u32::MAX as i64;
