//! # Domain Types
//!
//! Catalog and identity types shared by the cart, coupon and order modules.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Percentage    │   │    UserRole     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  bps (u32)      │   │  User           │       │
//! │  │  title          │   │  1000 = 10%     │   │  Designer       │       │
//! │  │  price_cents    │   └─────────────────┘   │  Admin          │       │
//! │  │  stock / sales  │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Live vs Snapshot
//! A [`Product`] is the live, authoritative record: its `stock` decides
//! whether a checkout succeeds. Carts and orders never hold a `Product`;
//! they hold a [`PriceSnapshot`](crate::cart::PriceSnapshot) copied from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::PriceSnapshot;
use crate::error::ValidationError;
use crate::validation::{validate_price_cents, validate_stock, validate_title};

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1250 bps = 12.5%, still an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100%.
    pub const FULL: Percentage = Percentage(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// User Role
// =============================================================================

/// Role carried in the caller's access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A buyer.
    #[default]
    User,
    /// A seller publishing designs.
    Designer,
    Admin,
}

impl UserRole {
    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Whether this role may publish products.
    #[inline]
    pub fn can_sell(&self) -> bool {
        matches!(self, UserRole::Designer | UserRole::Admin)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A sellable design in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Current price in cents.
    pub price_cents: i64,

    /// Units available. Never negative.
    pub stock: i64,

    /// Units sold through checkout.
    pub sales: i64,

    /// Primary image URL.
    pub image: Option<String>,

    /// Seller who published the design.
    pub designer_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Copies the display fields a cart line keeps.
    pub fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            title: self.title.clone(),
            price_cents: self.price_cents,
            image: self.image.clone(),
        }
    }
}

/// Input for publishing a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    /// Price in cents. Also accepted as `price`.
    #[serde(alias = "price")]
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            title: "Linen Shirt".to_string(),
            price_cents: 4500,
            stock,
            sales: 0,
            image: Some("https://cdn.example.com/linen.png".to_string()),
            designer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_from_bps() {
        let rate = Percentage::from_bps(1250);
        assert_eq!(rate.bps(), 1250);
        assert_eq!(Percentage::FULL.bps(), 10_000);
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Designer.is_admin());
        assert!(UserRole::Designer.can_sell());
        assert!(!UserRole::User.can_sell());
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_role_serde() {
        let role: UserRole = serde_json::from_str("\"designer\"").unwrap();
        assert_eq!(role, UserRole::Designer);
    }

    #[test]
    fn test_has_stock() {
        let p = product(2);
        assert!(p.has_stock(2));
        assert!(!p.has_stock(3));
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let p = product(5);
        let snap = p.snapshot();
        assert_eq!(snap.title, "Linen Shirt");
        assert_eq!(snap.price_cents, 4500);
        assert_eq!(snap.image.as_deref(), Some("https://cdn.example.com/linen.png"));
    }

    #[test]
    fn test_new_product_validation() {
        let ok = NewProduct {
            title: "Tee".to_string(),
            price_cents: 1500,
            stock: 10,
            image: None,
        };
        assert!(ok.validate().is_ok());

        let bad = NewProduct { stock: -1, ..ok.clone() };
        assert!(bad.validate().is_err());

        let untitled = NewProduct { title: "  ".to_string(), ..ok };
        assert!(untitled.validate().is_err());
    }
}
