//! Coupon service: apply/remove on the caller's cart, listing, creation.
//!
//! Applying a coupon only records its id on the cart. The usage slot is
//! consumed at checkout.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::services::save_cart;
use vitrine_core::coupon::normalize_code;
use vitrine_core::{Cart, CoreError, Coupon, NewCoupon, UserRole};
use vitrine_db::Database;

/// Body of `POST /coupons/apply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// Applies `code` to the user's cart, creating the cart if needed.
///
/// ## Errors (in this order)
/// - `COUPON_NOT_FOUND` (unknown or inactive)
/// - `COUPON_EXPIRED`
/// - `COUPON_LIMIT`
/// - `COUPON_FORBIDDEN`
/// - `COUPON_ALREADY_APPLIED`
pub async fn apply(db: &Database, user_id: &str, code: &str) -> ApiResult<Cart> {
    let now = Utc::now();

    let coupon = db
        .coupons()
        .get_by_code(code)
        .await?
        .ok_or_else(|| CoreError::CouponNotFound(normalize_code(code)))?;

    coupon.check_redeemable(user_id, now)?;

    let mut cart = db.carts().get_or_create(user_id).await?;
    cart.apply_coupon(&coupon.id, &coupon.code)?;

    let cart = save_cart(db, cart).await?;
    info!(user_id = %user_id, code = %coupon.code, "Coupon applied");
    Ok(cart)
}

/// Removes `coupon_id` from the user's cart. Absent ids are a no-op.
///
/// ## Errors
/// - `CART_NOT_FOUND` if the user has no cart
pub async fn remove(db: &Database, user_id: &str, coupon_id: &str) -> ApiResult<Cart> {
    let mut cart = db
        .carts()
        .get(user_id)
        .await?
        .ok_or_else(|| CoreError::CartNotFound(user_id.to_string()))?;

    if !cart.remove_coupon(coupon_id) {
        return Ok(cart);
    }

    Ok(save_cart(db, cart).await?)
}

/// Coupons the caller may see. Admins see all of them.
pub async fn list_for_user(db: &Database, user_id: &str, role: UserRole) -> ApiResult<Vec<Coupon>> {
    let now = Utc::now();
    let coupons = db.coupons().list_all().await?;

    Ok(coupons
        .into_iter()
        .filter(|coupon| coupon.is_visible_to(user_id, role, now))
        .collect())
}

/// Creates a coupon. The caller has already been checked for the admin role.
///
/// ## Errors
/// - `VALIDATION_ERROR` for invalid fields or a code already in use
pub async fn create(db: &Database, new: NewCoupon) -> ApiResult<Coupon> {
    let now = Utc::now();
    new.validate(now).map_err(CoreError::from)?;

    let coupon = new.into_coupon(Uuid::new_v4().to_string(), now);
    let coupon = db.coupons().insert(&coupon).await?;

    info!(id = %coupon.id, code = %coupon.code, "Coupon created");
    Ok(coupon)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cart_service::{self, AddToCartRequest};
    use crate::services::test_support::{coupon, db, product};
    use chrono::Duration;
    use vitrine_core::DiscountType;

    fn new_coupon(code: &str) -> NewCoupon {
        NewCoupon {
            code: code.to_string(),
            discount_type: DiscountType::FixedAmount,
            discount_value: 500,
            min_purchase_cents: 0,
            expires_at: Utc::now() + Duration::days(3),
            usage_limit: Some(2),
            assigned_to: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_apply_twice_then_after_remove() {
        let db = db().await;
        let c = coupon(&db, "SAVE10", DiscountType::Percentage, 1000, None).await;

        let cart = apply(&db, "u1", "save10").await.unwrap();
        assert_eq!(cart.applied_coupons, vec![c.id.clone()]);

        let err = apply(&db, "u1", "SAVE10").await.unwrap_err();
        assert_eq!(err.code, "COUPON_ALREADY_APPLIED");

        let cart = remove(&db, "u1", &c.id).await.unwrap();
        assert!(cart.applied_coupons.is_empty());

        assert!(apply(&db, "u1", "SAVE10").await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_does_not_consume_usage() {
        let db = db().await;
        let c = coupon(&db, "ONCE", DiscountType::FixedAmount, 500, Some(1)).await;

        apply(&db, "u1", "ONCE").await.unwrap();
        apply(&db, "u2", "ONCE").await.unwrap();

        let stored = db.coupons().get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 0);
    }

    #[tokio::test]
    async fn test_apply_errors() {
        let db = db().await;
        assert_eq!(apply(&db, "u1", "NOPE").await.unwrap_err().code, "COUPON_NOT_FOUND");

        let mut mine = new_coupon("MINE");
        mine.assigned_to = Some("u2".to_string());
        create(&db, mine).await.unwrap();

        let err = apply(&db, "u1", "MINE").await.unwrap_err();
        assert_eq!(err.code, "COUPON_FORBIDDEN");
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
        assert!(apply(&db, "u2", "MINE").await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_updates_discount() {
        let db = db().await;
        let p = product(&db, 20000, 5).await;
        cart_service::add_item(
            &db,
            "u1",
            AddToCartRequest {
                design_id: p.id.clone(),
                quantity: 1,
                size: "L".to_string(),
                color: "red".to_string(),
                title: None,
                price: None,
                image: None,
            },
        )
        .await
        .unwrap();

        coupon(&db, "TEN", DiscountType::Percentage, 1000, None).await;
        coupon(&db, "FIFTY", DiscountType::FixedAmount, 5000, None).await;

        apply(&db, "u1", "TEN").await.unwrap();
        let cart = apply(&db, "u1", "FIFTY").await.unwrap();
        assert_eq!(cart.total_discount_cents, 7000);
    }

    #[tokio::test]
    async fn test_remove_requires_cart() {
        let db = db().await;
        assert_eq!(remove(&db, "u1", "c1").await.unwrap_err().code, "CART_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_visibility() {
        let db = db().await;
        create(&db, new_coupon("PUBLIC")).await.unwrap();

        let mut private = new_coupon("PRIVATE");
        private.assigned_to = Some("u2".to_string());
        create(&db, private).await.unwrap();

        let mut inactive = new_coupon("OFF");
        inactive.is_active = false;
        create(&db, inactive).await.unwrap();

        let codes = |list: Vec<Coupon>| {
            let mut codes: Vec<String> = list.into_iter().map(|c| c.code).collect();
            codes.sort();
            codes
        };

        let u1 = list_for_user(&db, "u1", UserRole::User).await.unwrap();
        assert_eq!(codes(u1), vec!["PUBLIC"]);

        let u2 = list_for_user(&db, "u2", UserRole::User).await.unwrap();
        assert_eq!(codes(u2), vec!["PRIVATE", "PUBLIC"]);

        let admin = list_for_user(&db, "root", UserRole::Admin).await.unwrap();
        assert_eq!(admin.len(), 3);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let db = db().await;

        let created = create(&db, new_coupon("spring")).await.unwrap();
        assert_eq!(created.code, "SPRING");

        let err = create(&db, new_coupon("SPRING")).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.message, "coupon code already exists");

        let mut past = new_coupon("PAST");
        past.expires_at = Utc::now() - Duration::days(1);
        assert_eq!(create(&db, past).await.unwrap_err().code, "VALIDATION_ERROR");
    }
}
