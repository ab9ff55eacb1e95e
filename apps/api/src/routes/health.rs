//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ok, ApiResponse};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: &'static str,
}

/// Always 200; `database` reports whether a trivial query succeeds.
async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Health>> {
    let database = if state.db.health_check().await {
        "connected"
    } else {
        "unavailable"
    };

    ok(Health {
        status: "ok",
        database,
    })
}
