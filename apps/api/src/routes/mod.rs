//! HTTP routes.
//!
//! ## Route Table
//! ```text
//! ┌──────────────────────────────┬────────────────┬───────────────────────────────┐
//! │ Route                        │ Auth           │ Service                       │
//! ├──────────────────────────────┼────────────────┼───────────────────────────────┤
//! │ GET    /cart                 │ user           │ cart_service::get_cart        │
//! │ POST   /cart                 │ user           │ cart_service::add_item        │
//! │ DELETE /cart                 │ user           │ cart_service::clear           │
//! │ DELETE /cart/{itemId}        │ user           │ cart_service::remove_item     │
//! │ POST   /cart/sync            │ user           │ cart_service::sync            │
//! │ POST   /coupons/apply        │ user           │ coupon_service::apply         │
//! │ DELETE /coupons/remove/{id}  │ user           │ coupon_service::remove        │
//! │ GET    /coupons              │ user           │ coupon_service::list_for_user │
//! │ POST   /coupons              │ admin          │ coupon_service::create        │
//! │ POST   /orders               │ user           │ order_service::checkout       │
//! │ GET    /orders/myorders      │ user           │ order_service::list_mine      │
//! │ GET    /orders               │ admin          │ order_service::list_all       │
//! │ GET    /orders/{id}          │ owner/admin    │ order_service::get            │
//! │ PUT    /orders/{id}/status   │ admin          │ order_service::update_status  │
//! │ POST   /products             │ designer/admin │ product_service::create       │
//! │ GET    /products/{id}        │ public         │ product_service::get          │
//! │ GET    /health               │ public         │ Database::health_check        │
//! └──────────────────────────────┴────────────────┴───────────────────────────────┘
//! ```
//!
//! Authentication comes from the [`AuthUser`](crate::auth::AuthUser)
//! extractor. Role checks happen in the handler before the service call.

mod cart;
mod coupons;
mod health;
mod orders;
mod products;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// All routes, without state or middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(cart::router())
        .merge(coupons::router())
        .merge(orders::router())
        .merge(products::router())
        .merge(health::router())
}
