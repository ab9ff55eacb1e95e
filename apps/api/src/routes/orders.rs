//! Order routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::error::{created, ok, ApiJson, ApiResponse, ApiResult};
use crate::services::order_service::{self, CreateOrderRequest, UpdateStatusRequest};
use crate::AppState;
use vitrine_core::Order;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_all).post(checkout))
        .route("/orders/myorders", get(list_mine))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", put(update_status))
}

async fn checkout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = order_service::checkout(&state.db, &user.user_id, req).await?;
    Ok(created(order))
}

async fn list_mine(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Order>>>> {
    Ok(ok(order_service::list_mine(&state.db, &user.user_id).await?))
}

async fn list_all(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Order>>>> {
    user.require_admin()?;
    Ok(ok(order_service::list_all(&state.db).await?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let order = order_service::get(&state.db, &user.user_id, user.role, &id).await?;
    Ok(ok(order))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    user.require_admin()?;
    let order = order_service::update_status(&state.db, &id, &req.status).await?;
    Ok(ok(order))
}
