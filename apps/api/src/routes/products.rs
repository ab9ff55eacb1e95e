//! Product routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::error::{created, ok, ApiJson, ApiResponse, ApiResult};
use crate::services::product_service;
use crate::AppState;
use vitrine_core::{NewProduct, Product};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", post(create))
        .route("/products/{id}", get(get_product))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(new): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    user.require_seller()?;
    let product = product_service::create(&state.db, &user.user_id, new).await?;
    Ok(created(product))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    Ok(ok(product_service::get(&state.db, &id).await?))
}
