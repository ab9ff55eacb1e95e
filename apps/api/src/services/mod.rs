//! Service layer.
//!
//! Each service combines `vitrine-core` rules with `vitrine-db` repositories.
//! Handlers in [`crate::routes`] only extract, call one service function and
//! wrap the result in the response envelope.
//!
//! ```text
//! ┌────────────────┐  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//! │ cart_service   │  │ coupon_service │  │ order_service  │  │ product_service│
//! │                │  │                │  │                │  │                │
//! │ • get_cart     │  │ • apply        │  │ • checkout     │  │ • create       │
//! │ • add_item     │  │ • remove       │  │ • get          │  │ • get          │
//! │ • remove_item  │  │ • list_for_user│  │ • list_mine    │  │                │
//! │ • clear        │  │ • create       │  │ • list_all     │  │                │
//! │ • sync         │  │                │  │ • update_status│  │                │
//! └────────────────┘  └────────────────┘  └────────────────┘  └────────────────┘
//! ```

pub mod cart_service;
pub mod coupon_service;
pub mod order_service;
pub mod product_service;

use chrono::{DateTime, Utc};

use vitrine_core::{discount, Cart};
use vitrine_db::{Database, DbResult};

/// Recomputes the cart's cached discount against current coupon state.
pub(crate) async fn refresh_discount(
    db: &Database,
    cart: &mut Cart,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let coupons = db.coupons().get_many(&cart.applied_coupons).await?;
    cart.total_discount_cents = discount::compute(&cart.items, &coupons, now).discount.cents();
    Ok(())
}

/// Recomputes the discount and writes the cart (compare-and-swap on version).
pub(crate) async fn save_cart(db: &Database, mut cart: Cart) -> DbResult<Cart> {
    refresh_discount(db, &mut cart, Utc::now()).await?;
    db.carts().save(&cart).await
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the service tests.

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use vitrine_core::{Coupon, DiscountType, NewCoupon, Product};
    use vitrine_db::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(db: &Database, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            title: "Wave Tee".to_string(),
            price_cents,
            stock,
            sales: 0,
            image: Some("https://cdn.example.com/wave.png".to_string()),
            designer_id: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap()
    }

    pub async fn coupon(
        db: &Database,
        code: &str,
        discount_type: DiscountType,
        discount_value: i64,
        usage_limit: Option<i64>,
    ) -> Coupon {
        let now = Utc::now();
        let coupon = NewCoupon {
            code: code.to_string(),
            discount_type,
            discount_value,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(7),
            usage_limit,
            assigned_to: None,
            is_active: true,
        }
        .into_coupon(Uuid::new_v4().to_string(), now);
        db.coupons().insert(&coupon).await.unwrap()
    }
}
