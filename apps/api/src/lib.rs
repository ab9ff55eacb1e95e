//! # Vitrine API
//!
//! HTTP/JSON server for carts, coupons and the cart-to-order checkout.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Vitrine API                                   │
//! │                                                                         │
//! │  Request ──► TraceLayer ──► CorsLayer ──► routes ──► services           │
//! │                                             │            │              │
//! │                                        AuthUser      vitrine-core       │
//! │                                        (JWT)         vitrine-db         │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                                       SQLite            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is honoured):
//! - `VITRINE_HTTP_PORT` - HTTP port (default: 8080)
//! - `VITRINE_DATABASE_PATH` - SQLite file (default: ./data/vitrine.db)
//! - `VITRINE_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `VITRINE_CORS_ORIGIN` - Allowed origin (default: any)
//! - `JWT_SECRET` - Secret for JWT validation
//! - `JWT_ACCESS_LIFETIME_SECS` - Longest accepted token lifetime (default: 3600)
//! - `RUST_LOG` - Log filter (default: info)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

// Re-exports
pub use auth::{AuthUser, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use vitrine_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState { db, jwt, config }
    }
}

/// Builds the application router with middleware attached.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    routes::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid VITRINE_CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vitrine_core::UserRole;
    use vitrine_db::DbConfig;

    async fn state() -> Arc<AppState> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Arc::new(AppState::new(db, ApiConfig::for_tests()))
    }

    fn token(state: &AppState, user_id: &str, role: UserRole) -> String {
        state.jwt.generate_access_token(user_id, role).unwrap()
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(state().await);
        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["database"], "connected");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token() {
        let app = app(state().await);

        let (status, body) = send(&app, request(Method::GET, "/cart", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_AUTHORIZED");
        assert!(body.get("data").is_none());

        let (status, _) = send(&app, request(Method::GET, "/cart", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let state = state().await;
        let user = token(&state, "u1", UserRole::User);
        let app = app(state);

        let (status, body) = send(
            &app,
            request(Method::POST, "/cart", Some(&user), Some(json!({ "quantity": 1 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_role_guards() {
        let state = state().await;
        let user = token(&state, "u1", UserRole::User);
        let app = app(state);

        let product = json!({ "title": "Tee", "price": 1000, "stock": 1 });
        let (status, body) = send(
            &app,
            request(Method::POST, "/products", Some(&user), Some(product)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = send(&app, request(Method::GET, "/orders", Some(&user), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            request(
                Method::PUT,
                "/orders/whatever/status",
                Some(&user),
                Some(json!({ "status": "shipped" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cart_to_order_flow() {
        let state = state().await;
        let designer = token(&state, "d1", UserRole::Designer);
        let admin = token(&state, "root", UserRole::Admin);
        let user = token(&state, "u1", UserRole::User);
        let stranger = token(&state, "u2", UserRole::User);
        let app = app(state);

        // Publish a design
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/products",
                Some(&designer),
                Some(json!({ "title": "Orbit Tee", "price": 10000, "stock": 5 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let product_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            request(Method::GET, &format!("/products/{}", product_id), None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["priceCents"], 10000);

        // Admin creates coupons
        let expires = (chrono::Utc::now() + chrono::Duration::days(3)).to_rfc3339();
        for (code, kind, value) in [("TEN", "percentage", 1000), ("FIFTY", "fixed_amount", 5000)] {
            let (status, body) = send(
                &app,
                request(
                    Method::POST,
                    "/coupons",
                    Some(&admin),
                    Some(json!({
                        "code": code,
                        "discountType": kind,
                        "discountValue": value,
                        "expiresAt": expires,
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
        }

        // Fill the cart
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/cart",
                Some(&user),
                Some(json!({ "designId": product_id, "quantity": 2, "size": "M", "color": "navy" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["subtotal"], 20000);
        assert_eq!(body["data"]["items"][0]["snapshot"]["title"], "Orbit Tee");

        for code in ["ten", "FIFTY"] {
            let (status, body) = send(
                &app,
                request(Method::POST, "/coupons/apply", Some(&user), Some(json!({ "code": code }))),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["data"]["cart"]["appliedCoupons"].is_array());
        }

        let (_, body) = send(&app, request(Method::GET, "/cart", Some(&user), None)).await;
        assert_eq!(body["data"]["totalDiscount"], 7000);

        // Checkout
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/orders",
                Some(&user),
                Some(json!({
                    "shippingAddress": {
                        "address": "1 Main St",
                        "city": "Springfield",
                        "postalCode": "12345",
                        "country": "US"
                    }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["totalCents"], 20000);
        assert_eq!(body["data"]["discountCents"], 7000);
        assert_eq!(body["data"]["finalCents"], 13000);
        assert_eq!(body["data"]["status"], "pending");
        let order_id = body["data"]["id"].as_str().unwrap().to_string();

        // Second checkout finds an empty cart
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/orders",
                Some(&user),
                Some(json!({
                    "shippingAddress": {
                        "address": "1 Main St",
                        "city": "Springfield",
                        "postalCode": "12345",
                        "country": "US"
                    }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_CART");

        let (_, body) = send(&app, request(Method::GET, "/orders/myorders", Some(&user), None)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                &format!("/orders/{}/status", order_id),
                Some(&admin),
                Some(json!({ "status": "shipped" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "shipped");

        let (status, body) = send(
            &app,
            request(Method::GET, &format!("/orders/{}", order_id), Some(&stranger), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let state = state().await;
        let user = token(&state, "u1", UserRole::User);
        let app = app(state);

        let (status, body) = send(&app, request(Method::DELETE, "/cart/abc", Some(&user), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CART_NOT_FOUND");

        let (status, body) = send(
            &app,
            request(Method::GET, "/orders/nope", Some(&user), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "ORDER_NOT_FOUND");
    }
}
