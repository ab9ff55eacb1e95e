//! # Error Types
//!
//! Domain-specific error types for vitrine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrine-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule failures (stable codes)          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrine-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What clients see: {success, code, message}     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Client                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Machine Codes
//! Every [`CoreError`] maps to a stable SCREAMING_SNAKE_CASE code through
//! [`CoreError::code`]. Clients branch on the code and show the message.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart-to-order pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Checkout attempted on a missing or empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product referenced by a cart line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough stock to fulfil a line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 3)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Client shows: "Only 2 left in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The user has no cart yet.
    #[error("Cart not found for user {0}")]
    CartNotFound(String),

    /// The cart was written by another request since it was read.
    #[error("Cart for user {0} was modified concurrently, retry the request")]
    CartConflict(String),

    /// Coupon code is unknown or the coupon is inactive.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("Coupon {0} has expired")]
    CouponExpired(String),

    /// Coupon reached its global usage limit.
    #[error("Coupon {0} has reached its usage limit")]
    CouponLimitReached(String),

    /// Coupon is assigned to a different user.
    #[error("Coupon {0} is not available for this user")]
    CouponForbidden(String),

    #[error("Coupon {0} is already applied to this cart")]
    CouponAlreadyApplied(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Authenticated user may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No authenticated user.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Malformed identifier in a path or body.
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the stable machine-readable code for this error.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::CoreError;
    ///
    /// assert_eq!(CoreError::EmptyCart.code(), "EMPTY_CART");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::EmptyCart => "EMPTY_CART",
            CoreError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::CartNotFound(_) => "CART_NOT_FOUND",
            CoreError::CartConflict(_) => "CART_CONFLICT",
            CoreError::CouponNotFound(_) => "COUPON_NOT_FOUND",
            CoreError::CouponExpired(_) => "COUPON_EXPIRED",
            CoreError::CouponLimitReached(_) => "COUPON_LIMIT",
            CoreError::CouponForbidden(_) => "COUPON_FORBIDDEN",
            CoreError::CouponAlreadyApplied(_) => "COUPON_ALREADY_APPLIED",
            CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::NotAuthorized(_) => "NOT_AUTHORIZED",
            CoreError::InvalidId(_) => "INVALID_ID",
            CoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
