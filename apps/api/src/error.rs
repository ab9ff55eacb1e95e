//! Error types and the response envelope for the HTTP API.
//!
//! ## Envelope
//! ```text
//! success:  { "success": true,  "data": { ... } }
//! failure:  { "success": false, "code": "COUPON_EXPIRED", "message": "..." }
//! ```
//!
//! ## Status Mapping
//! ```text
//! NOT_AUTHORIZED                   → 401
//! FORBIDDEN, COUPON_FORBIDDEN      → 403
//! *_NOT_FOUND                      → 404
//! CART_CONFLICT                    → 409
//! INTERNAL_ERROR                   → 500 (details logged, never returned)
//! everything else                  → 400
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use vitrine_core::CoreError;
use vitrine_db::DbError;

// =============================================================================
// Envelope
// =============================================================================

/// Wrapper around every response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            code: None,
        }
    }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// 201 with `data`.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// An error as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    /// Builds an error whose status follows from `code`.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status: status_for_code(code),
            code,
            message: message.into(),
        }
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        ApiError::new("NOT_AUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new("FORBIDDEN", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new("VALIDATION_ERROR", message)
    }

    /// Generic 500. Callers log the cause before building this.
    pub fn internal() -> Self {
        ApiError::new("INTERNAL_ERROR", "Internal server error")
    }
}

fn status_for_code(code: &str) -> StatusCode {
    match code {
        "NOT_AUTHORIZED" => StatusCode::UNAUTHORIZED,
        "FORBIDDEN" | "COUPON_FORBIDDEN" => StatusCode::FORBIDDEN,
        "CART_CONFLICT" => StatusCode::CONFLICT,
        "INTERNAL_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
        c if c.ends_with("_NOT_FOUND") => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(err.code(), err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { entity, .. } => {
                let code = match entity.as_str() {
                    "Cart" => "CART_NOT_FOUND",
                    "Order" => "ORDER_NOT_FOUND",
                    "Product" => "PRODUCT_NOT_FOUND",
                    "Coupon" => "COUPON_NOT_FOUND",
                    _ => {
                        tracing::error!(error = %err, "Unmapped not-found error");
                        return ApiError::internal();
                    }
                };
                ApiError::new(code, err.to_string())
            }
            DbError::VersionConflict { id, .. } => CoreError::CartConflict(id.clone()).into(),
            DbError::UniqueViolation { field, .. } => {
                tracing::debug!(error = %err, "Unique constraint rejected write");
                match field.as_str() {
                    "code" => ApiError::validation("coupon code already exists"),
                    _ => ApiError::validation("value already exists"),
                }
            }
            _ => {
                tracing::error!(error = %err, "Database error");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            message: Some(self.message),
            code: Some(self.code.to_string()),
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// JSON body extractor
// =============================================================================

/// `axum::Json` whose rejection is a `VALIDATION_ERROR` envelope instead of
/// axum's plain-text 4xx.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}
