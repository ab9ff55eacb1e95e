//! JWT authentication module.
//!
//! Tokens are issued by the external identity service; this server only
//! validates them and provides the [`AuthUser`] extractor that every
//! protected handler takes.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! AuthUser::from_request_parts
//!        │  missing header / not "Bearer " / bad signature / expired
//!        │  lifetime longer than JWT_ACCESS_LIFETIME_SECS
//!        ├──────────────────────────────────────────────► 401 NOT_AUTHORIZED
//!        ▼
//! AuthUser { user_id: claims.sub, role: claims.role }
//! ```

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;
use vitrine_core::UserRole;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Role of the user
    #[serde(default)]
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token lifetime of {0}s exceeds the accepted maximum")]
    LifetimeTooLong(i64),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::not_authorized(err.to_string())
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    /// Longest `exp - iat` span accepted
    access_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    /// Issues a token the way the identity service does. Test builds only.
    #[cfg(test)]
    pub fn generate_access_token(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> jsonwebtoken::errors::Result<String> {
        use chrono::{Duration, Utc};
        use jsonwebtoken::{encode, EncodingKey, Header};
        use uuid::Uuid;

        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let lifetime = token_data.claims.exp.saturating_sub(token_data.claims.iat);
        if lifetime > self.access_lifetime_secs {
            return Err(AuthError::LifetimeTooLong(lifetime));
        }

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller.
///
/// ## Example
/// ```rust,ignore
/// async fn get_cart(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<...> {
///     cart_service::get_cart(&state.db, &user.user_id).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthUser {
    /// `FORBIDDEN` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin role required"))
        }
    }

    /// `FORBIDDEN` unless the caller may publish products.
    pub fn require_seller(&self) -> Result<(), ApiError> {
        if self.role.can_sell() {
            Ok(())
        } else {
            Err(ApiError::forbidden("designer or admin role required"))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::not_authorized("missing bearer token"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::not_authorized("malformed authorization header"))?;

        let claims = state.jwt.validate_token(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
