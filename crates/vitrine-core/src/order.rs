//! # Orders
//!
//! The immutable financial record produced by checkout.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. ASSEMBLE (checkout)                                                │
//! │     └── Order::from_cart() → Order { status: Pending }                 │
//! │         items, totals and coupons frozen from the cart                 │
//! │                                                                         │
//! │  2. ADMIN STATUS CHANGES                                               │
//! │     └── pending ⇄ processing ⇄ shipped ⇄ delivered ⇄ cancelled         │
//! │         any status may be set from any other                           │
//! │                                                                         │
//! │  Nothing but `status` ever changes after step 1.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartItem, PriceSnapshot};
use crate::discount::DiscountBreakdown;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::UserRole;
use crate::validation::validate_attribute;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Shipping & Payment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.address.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "address".to_string(),
            });
        }
        if self.address.chars().count() > 200 {
            return Err(ValidationError::TooLong {
                field: "address".to_string(),
                max: 200,
            });
        }
        validate_attribute("city", &self.city)?;
        validate_attribute("postal_code", &self.postal_code)?;
        validate_attribute("country", &self.country)?;
        Ok(())
    }
}

/// Pass-through reference to an external payment. Not processed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
}

// =============================================================================
// Order Item
// =============================================================================

/// A frozen copy of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub snapshot: PriceSnapshot,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.snapshot.price().multiply_quantity(self.quantity)
    }
}

impl From<&CartItem> for OrderItem {
    fn from(line: &CartItem) -> Self {
        OrderItem {
            product_id: line.product_id.clone(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            snapshot: line.snapshot.clone(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    /// Pre-discount subtotal in cents.
    pub total_cents: i64,
    pub discount_cents: i64,
    /// `total_cents − discount_cents`.
    pub final_cents: i64,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_info: Option<PaymentInfo>,
    pub applied_coupons: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Freezes `cart` into a pending order.
    ///
    /// `applied_coupons` are the coupon ids that still resolved at checkout.
    pub fn from_cart(
        id: String,
        cart: &Cart,
        breakdown: DiscountBreakdown,
        applied_coupons: Vec<String>,
        shipping_address: ShippingAddress,
        payment_info: Option<PaymentInfo>,
        now: DateTime<Utc>,
    ) -> Self {
        Order {
            id,
            user_id: cart.user_id.clone(),
            items: cart.items.iter().map(OrderItem::from).collect(),
            total_cents: breakdown.subtotal.cents(),
            discount_cents: breakdown.discount.cents(),
            final_cents: breakdown.final_amount.cents(),
            status: OrderStatus::Pending,
            shipping_address,
            payment_info,
            applied_coupons,
            created_at: now,
            updated_at: now,
        }
    }

    /// Owner or admin only.
    ///
    /// ## Errors
    /// - `FORBIDDEN` for anyone else
    pub fn check_viewable_by(&self, user_id: &str, role: UserRole) -> CoreResult<()> {
        if role.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "order {} belongs to another user",
                self.id
            )))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::NewCartItem;
    use crate::discount::compute;

    fn address() -> ShippingAddress {
        ShippingAddress {
            address: "12 Rue de Rivoli".to_string(),
            city: "Paris".to_string(),
            postal_code: "75001".to_string(),
            country: "FR".to_string(),
        }
    }

    fn cart_with_lines() -> Cart {
        let mut cart = Cart::new("user-1", Utc::now());
        for (pid, price, qty) in [("p1", 2500, 2), ("p2", 1000, 1)] {
            cart.add_item(NewCartItem {
                product_id: pid.to_string(),
                size: "M".to_string(),
                color: "black".to_string(),
                quantity: qty,
                snapshot: PriceSnapshot {
                    title: pid.to_string(),
                    price_cents: price,
                    image: None,
                },
            })
            .unwrap();
        }
        cart
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" Cancelled ".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(OrderStatus::Delivered.to_string(), "delivered");
    }

    #[test]
    fn test_from_cart_snapshots_lines() {
        let cart = cart_with_lines();
        let breakdown = compute(&cart.items, &[], Utc::now());
        let order = Order::from_cart(
            "o1".to_string(),
            &cart,
            breakdown,
            vec![],
            address(),
            None,
            Utc::now(),
        );

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_cents, 6000);
        assert_eq!(order.final_cents, order.total_cents - order.discount_cents);

        let from_items: i64 = order.items.iter().map(|i| i.line_total().cents()).sum();
        assert_eq!(from_items, order.total_cents);
    }

    #[test]
    fn test_viewable_by_owner_or_admin() {
        let cart = cart_with_lines();
        let order = Order::from_cart(
            "o1".to_string(),
            &cart,
            compute(&cart.items, &[], Utc::now()),
            vec![],
            address(),
            None,
            Utc::now(),
        );

        assert!(order.check_viewable_by("user-1", UserRole::User).is_ok());
        assert!(order.check_viewable_by("someone", UserRole::Admin).is_ok());
        assert_eq!(
            order.check_viewable_by("someone", UserRole::User).unwrap_err().code(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn test_shipping_address_validation() {
        assert!(address().validate().is_ok());

        let missing_city = ShippingAddress { city: "".to_string(), ..address() };
        assert!(missing_city.validate().is_err());
    }
}
