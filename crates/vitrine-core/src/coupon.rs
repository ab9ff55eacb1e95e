//! # Coupons
//!
//! Coupon records and the eligibility rules shared by apply, listing and the
//! discount cascade.
//!
//! ## Where Each Rule Is Checked
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rule                     apply   list   discount   checkout redeem     │
//! │  ───────────────────────  ─────   ────   ────────   ───────────────     │
//! │  is_active                  ✓      ✓        ✓                            │
//! │  not expired                ✓      ✓        ✓                            │
//! │  used_count < usage_limit   ✓                         ✓ (atomic)         │
//! │  assigned_to == user        ✓      ✓                                     │
//! │  not already applied        ✓                                            │
//! │  min purchase <= subtotal                   ✓                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Redemption (consuming a usage slot) happens only at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Percentage, UserRole};
use crate::validation::{validate_coupon_code, validate_percentage_bps, validate_price_cents};
use crate::DEFAULT_USAGE_LIMIT;

/// Canonical form of a coupon code: trimmed, upper case.
///
/// ## Example
/// ```rust
/// use vitrine_core::coupon::normalize_code;
///
/// assert_eq!(normalize_code("  summer10 "), "SUMMER10");
/// ```
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// =============================================================================
// Discount Type
// =============================================================================

/// How `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is basis points of the running total.
    Percentage,
    /// `discount_value` is cents.
    FixedAmount,
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount rule with eligibility constraints and a global usage cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    /// Canonical upper-case code, unique.
    pub code: String,
    pub discount_type: DiscountType,
    /// Basis points for percentage coupons, cents for fixed ones.
    pub discount_value: i64,
    /// Minimum cart subtotal in cents.
    pub min_purchase_cents: i64,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    pub usage_limit: i64,
    pub used_count: i64,
    /// When set, only this user may redeem the coupon.
    pub assigned_to: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Expired strictly after `expires_at`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }

    #[inline]
    pub fn min_purchase(&self) -> Money {
        Money::from_cents(self.min_purchase_cents)
    }

    fn check_available(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::CouponNotFound(self.code.clone()));
        }
        if self.is_expired(now) {
            return Err(CoreError::CouponExpired(self.code.clone()));
        }
        Ok(())
    }

    fn check_assignment(&self, user_id: &str) -> CoreResult<()> {
        match &self.assigned_to {
            Some(owner) if owner != user_id => Err(CoreError::CouponForbidden(self.code.clone())),
            _ => Ok(()),
        }
    }

    /// Checks whether `user_id` may apply this coupon at `now`.
    ///
    /// ## Errors (in this order)
    /// - `COUPON_NOT_FOUND` if inactive
    /// - `COUPON_EXPIRED`
    /// - `COUPON_LIMIT` if every usage slot is consumed
    /// - `COUPON_FORBIDDEN` if assigned to another user
    pub fn check_redeemable(&self, user_id: &str, now: DateTime<Utc>) -> CoreResult<()> {
        self.check_available(now)?;
        if self.is_exhausted() {
            return Err(CoreError::CouponLimitReached(self.code.clone()));
        }
        self.check_assignment(user_id)?;
        Ok(())
    }

    /// Listing filter. Admins see everything; everyone else sees active,
    /// unexpired coupons that are unassigned or assigned to them.
    pub fn is_visible_to(&self, user_id: &str, role: UserRole, now: DateTime<Utc>) -> bool {
        role.is_admin()
            || (self.check_available(now).is_ok() && self.check_assignment(user_id).is_ok())
    }

    /// Whether the cascade should use this coupon for a cart with `subtotal`.
    ///
    /// The threshold is compared with the original subtotal, never with the
    /// total left after earlier coupons.
    pub fn applies_to(&self, subtotal: Money, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now) && self.min_purchase() <= subtotal
    }

    /// Raw reduction against `remaining`, before clamping.
    pub fn reduction(&self, remaining: Money) -> Money {
        match self.discount_type {
            DiscountType::Percentage => {
                let bps = self.discount_value.clamp(0, Percentage::FULL.bps() as i64) as u32;
                remaining.percent_of(Percentage::from_bps(bps))
            }
            DiscountType::FixedAmount => Money::from_cents(self.discount_value.max(0)),
        }
    }
}

// =============================================================================
// New Coupon
// =============================================================================

/// Admin input for creating a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub min_purchase_cents: i64,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewCoupon {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate_coupon_code(&self.code)?;

        match self.discount_type {
            DiscountType::Percentage => validate_percentage_bps(self.discount_value)?,
            DiscountType::FixedAmount => validate_price_cents(self.discount_value)?,
        }

        if self.min_purchase_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "min_purchase".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        if let Some(limit) = self.usage_limit {
            if limit < 1 {
                return Err(ValidationError::MustBePositive {
                    field: "usage_limit".to_string(),
                });
            }
        }

        if self.expires_at <= now {
            return Err(ValidationError::InvalidFormat {
                field: "expires_at".to_string(),
                reason: "must be in the future".to_string(),
            });
        }

        Ok(())
    }

    /// Builds the stored record with a canonical code and zero uses.
    pub fn into_coupon(self, id: String, now: DateTime<Utc>) -> Coupon {
        Coupon {
            id,
            code: normalize_code(&self.code),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_purchase_cents: self.min_purchase_cents,
            expires_at: self.expires_at,
            usage_limit: self.usage_limit.unwrap_or(DEFAULT_USAGE_LIMIT),
            used_count: 0,
            assigned_to: self.assigned_to,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(now: DateTime<Utc>) -> Coupon {
        NewCoupon {
            code: "save10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(7),
            usage_limit: Some(5),
            assigned_to: None,
            is_active: true,
        }
        .into_coupon("c1".to_string(), now)
    }

    #[test]
    fn test_into_coupon_canonicalises_code() {
        let now = Utc::now();
        let c = coupon(now);
        assert_eq!(c.code, "SAVE10");
        assert_eq!(c.used_count, 0);
        assert_eq!(c.usage_limit, 5);
    }

    #[test]
    fn test_default_usage_limit() {
        let now = Utc::now();
        let new = NewCoupon {
            code: "FOREVER".to_string(),
            discount_type: DiscountType::FixedAmount,
            discount_value: 500,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(1),
            usage_limit: None,
            assigned_to: None,
            is_active: true,
        };
        assert_eq!(new.into_coupon("c".into(), now).usage_limit, DEFAULT_USAGE_LIMIT);
    }

    #[test]
    fn test_redeemable_error_order() {
        let now = Utc::now();

        let mut c = coupon(now);
        c.is_active = false;
        c.expires_at = now - Duration::days(1);
        assert_eq!(c.check_redeemable("u1", now).unwrap_err().code(), "COUPON_NOT_FOUND");

        c.is_active = true;
        c.used_count = 5;
        assert_eq!(c.check_redeemable("u1", now).unwrap_err().code(), "COUPON_EXPIRED");

        c.expires_at = now + Duration::days(1);
        c.assigned_to = Some("u2".to_string());
        assert_eq!(c.check_redeemable("u1", now).unwrap_err().code(), "COUPON_LIMIT");

        c.used_count = 0;
        assert_eq!(c.check_redeemable("u1", now).unwrap_err().code(), "COUPON_FORBIDDEN");
        assert!(c.check_redeemable("u2", now).is_ok());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut c = coupon(now);
        c.expires_at = now;
        assert!(!c.is_expired(now));
        assert!(c.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn test_visibility() {
        let now = Utc::now();
        let mut c = coupon(now);
        c.assigned_to = Some("u2".to_string());

        assert!(!c.is_visible_to("u1", UserRole::User, now));
        assert!(c.is_visible_to("u2", UserRole::User, now));
        assert!(c.is_visible_to("u1", UserRole::Admin, now));

        // Exhausted coupons are still listed
        c.used_count = c.usage_limit;
        assert!(c.is_visible_to("u2", UserRole::User, now));

        c.expires_at = now - Duration::days(1);
        assert!(!c.is_visible_to("u2", UserRole::User, now));
        assert!(c.is_visible_to("u1", UserRole::Admin, now));
    }

    #[test]
    fn test_reduction() {
        let now = Utc::now();
        let mut c = coupon(now);
        assert_eq!(c.reduction(Money::from_cents(20000)).cents(), 2000);

        c.discount_type = DiscountType::FixedAmount;
        c.discount_value = 5000;
        assert_eq!(c.reduction(Money::from_cents(18000)).cents(), 5000);
    }

    #[test]
    fn test_new_coupon_validation() {
        let now = Utc::now();
        let valid = NewCoupon {
            code: "WELCOME".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 1500,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(30),
            usage_limit: None,
            assigned_to: None,
            is_active: true,
        };
        assert!(valid.validate(now).is_ok());

        let too_much = NewCoupon { discount_value: 10_001, ..valid.clone() };
        assert!(too_much.validate(now).is_err());

        let past = NewCoupon { expires_at: now - Duration::days(1), ..valid.clone() };
        assert!(past.validate(now).is_err());

        let zero_limit = NewCoupon { usage_limit: Some(0), ..valid };
        assert!(zero_limit.validate(now).is_err());
    }

    #[test]
    fn test_new_coupon_deserialize_defaults() {
        let json = r#"{
            "code": "spring",
            "discountType": "fixed_amount",
            "discountValue": 500,
            "expiresAt": "2030-01-01T00:00:00Z"
        }"#;
        let new: NewCoupon = serde_json::from_str(json).unwrap();
        assert!(new.is_active);
        assert_eq!(new.min_purchase_cents, 0);
        assert!(new.usage_limit.is_none());
    }
}
