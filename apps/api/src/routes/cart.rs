//! Cart routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::error::{ok, ApiJson, ApiResponse, ApiResult};
use crate::services::cart_service::{self, AddToCartRequest, CartView, SyncCartRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cart", get(get_cart).post(add_item).delete(clear))
        .route("/cart/sync", post(sync))
        .route("/cart/{item_id}", delete(remove_item))
}

type CartResponse = ApiResult<Json<ApiResponse<CartView>>>;

async fn get_cart(State(state): State<Arc<AppState>>, user: AuthUser) -> CartResponse {
    let cart = cart_service::get_cart(&state.db, &user.user_id).await?;
    Ok(ok(CartView::from(&cart)))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> CartResponse {
    let cart = cart_service::add_item(&state.db, &user.user_id, req).await?;
    Ok(ok(CartView::from(&cart)))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> CartResponse {
    let cart = cart_service::remove_item(&state.db, &user.user_id, &item_id).await?;
    Ok(ok(CartView::from(&cart)))
}

async fn clear(State(state): State<Arc<AppState>>, user: AuthUser) -> CartResponse {
    let cart = cart_service::clear(&state.db, &user.user_id).await?;
    Ok(ok(CartView::from(&cart)))
}

async fn sync(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<SyncCartRequest>,
) -> CartResponse {
    let cart = cart_service::sync(&state.db, &user.user_id, req.items).await?;
    Ok(ok(CartView::from(&cart)))
}
