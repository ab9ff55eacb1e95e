//! Coupon routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{created, ok, ApiJson, ApiResponse, ApiResult};
use crate::services::cart_service::CartView;
use crate::services::coupon_service::{self, ApplyCouponRequest};
use crate::AppState;
use vitrine_core::{Coupon, NewCoupon};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/coupons", get(list).post(create))
        .route("/coupons/apply", post(apply))
        .route("/coupons/remove/{id}", delete(remove))
}

/// `{ "cart": ... }`
#[derive(Debug, Serialize)]
struct CartPayload {
    cart: CartView,
}

async fn apply(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<ApplyCouponRequest>,
) -> ApiResult<Json<ApiResponse<CartPayload>>> {
    let cart = coupon_service::apply(&state.db, &user.user_id, &req.code).await?;
    Ok(ok(CartPayload {
        cart: CartView::from(&cart),
    }))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(coupon_id): Path<String>,
) -> ApiResult<Json<ApiResponse<CartPayload>>> {
    let cart = coupon_service::remove(&state.db, &user.user_id, &coupon_id).await?;
    Ok(ok(CartPayload {
        cart: CartView::from(&cart),
    }))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Coupon>>>> {
    let coupons = coupon_service::list_for_user(&state.db, &user.user_id, user.role).await?;
    Ok(ok(coupons))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewCoupon>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Coupon>>)> {
    user.require_admin()?;
    let coupon = coupon_service::create(&state.db, new).await?;
    Ok(created(coupon))
}
