//! Order service: checkout and the order record companions.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. lock cart row              (write lock held until COMMIT)         │
//! │   2. read cart                  missing / no items → EMPTY_CART        │
//! │   3. read every product         missing → PRODUCT_NOT_FOUND            │
//! │                                 stock < qty → INSUFFICIENT_STOCK       │
//! │   4. resolve applied coupons    deleted ids are dropped                │
//! │   5. discount::compute(now)                                            │
//! │   6. INSERT order (pending)                                            │
//! │   7. per line:   UPDATE products ... WHERE stock >= qty                │
//! │                  0 rows → INSUFFICIENT_STOCK                           │
//! │   8. per coupon: UPDATE coupons ... WHERE used_count < usage_limit     │
//! │                  0 rows → COUPON_LIMIT                                 │
//! │   9. reset cart, save WHERE version = v                                │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error returns early; dropping the transaction rolls back 1-9.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiResult;
use vitrine_core::{
    discount, CoreError, Order, OrderStatus, PaymentInfo, ShippingAddress, UserRole,
};
use vitrine_db::Database;

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_info: Option<PaymentInfo>,
}

/// Body of `PUT /orders/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Turns the user's cart into a pending order. All-or-nothing.
///
/// ## Errors
/// - `VALIDATION_ERROR` for an incomplete shipping address
/// - `EMPTY_CART`
/// - `PRODUCT_NOT_FOUND`
/// - `INSUFFICIENT_STOCK`
/// - `COUPON_LIMIT` if an applied coupon ran out of uses since it was applied
pub async fn checkout(db: &Database, user_id: &str, req: CreateOrderRequest) -> ApiResult<Order> {
    req.shipping_address.validate().map_err(CoreError::from)?;

    let now = Utc::now();
    let carts = db.carts();
    let products = db.products();
    let coupons = db.coupons();
    let orders = db.orders();

    let mut tx = db.begin().await?;

    if !carts.lock_tx(&mut tx, user_id).await? {
        return Err(CoreError::EmptyCart.into());
    }

    let mut cart = carts
        .get_tx(&mut tx, user_id)
        .await?
        .ok_or(CoreError::EmptyCart)?;
    if cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    // Lines of the same design in different sizes share one stock figure
    let mut requested: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in &cart.items {
        match index.get(&line.product_id) {
            Some(&i) => requested[i].1 += line.quantity,
            None => {
                index.insert(line.product_id.clone(), requested.len());
                requested.push((line.product_id.clone(), line.quantity));
            }
        }
    }

    for (product_id, quantity) in &requested {
        let product = products
            .get_by_id_tx(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        if !product.has_stock(*quantity) {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.clone(),
                available: product.stock,
                requested: *quantity,
            }
            .into());
        }
    }

    let applied = coupons.get_many_tx(&mut tx, &cart.applied_coupons).await?;
    let breakdown = discount::compute(&cart.items, &applied, now);
    let coupon_ids: Vec<String> = applied.iter().map(|c| c.id.clone()).collect();

    let order = Order::from_cart(
        Uuid::new_v4().to_string(),
        &cart,
        breakdown,
        coupon_ids,
        req.shipping_address,
        req.payment_info,
        now,
    );
    orders.insert_tx(&mut tx, &order).await?;

    for line in &cart.items {
        if !products
            .take_stock_tx(&mut tx, &line.product_id, line.quantity, now)
            .await?
        {
            let available = products
                .get_by_id_tx(&mut tx, &line.product_id)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id.clone(),
                available,
                requested: line.quantity,
            }
            .into());
        }
    }

    for coupon in &applied {
        if !coupons.redeem_tx(&mut tx, &coupon.id, now).await? {
            debug!(code = %coupon.code, "Coupon exhausted during checkout");
            return Err(CoreError::CouponLimitReached(coupon.code.clone()).into());
        }
    }

    cart.reset();
    carts.save_tx(&mut tx, &cart).await?;

    tx.commit().await.map_err(vitrine_db::DbError::from)?;

    info!(
        order_id = %order.id,
        user_id = %user_id,
        total_cents = order.total_cents,
        discount_cents = order.discount_cents,
        final_cents = order.final_cents,
        "Order created"
    );

    Ok(order)
}

/// Gets an order visible to the caller.
///
/// ## Errors
/// - `ORDER_NOT_FOUND`
/// - `FORBIDDEN` unless the caller owns the order or is an admin
pub async fn get(db: &Database, user_id: &str, role: UserRole, order_id: &str) -> ApiResult<Order> {
    let order = db
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    order.check_viewable_by(user_id, role)?;
    Ok(order)
}

/// The caller's orders, newest first.
pub async fn list_mine(db: &Database, user_id: &str) -> ApiResult<Vec<Order>> {
    Ok(db.orders().list_for_user(user_id).await?)
}

/// Every order, newest first. Admin only (checked by the route).
pub async fn list_all(db: &Database) -> ApiResult<Vec<Order>> {
    Ok(db.orders().list_all().await?)
}

/// Sets an order's status. Any status may follow any other.
///
/// ## Errors
/// - `VALIDATION_ERROR` for an unknown status
/// - `ORDER_NOT_FOUND`
pub async fn update_status(db: &Database, order_id: &str, status: &str) -> ApiResult<Order> {
    let status: OrderStatus = status.parse().map_err(CoreError::from)?;

    let order = db.orders().update_status(order_id, status).await?;
    info!(order_id = %order_id, status = %status, "Order status updated");
    Ok(order)
}

// =============================================================================
// Unit Tests
// =============================================================================
