//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file in the working directory is read first.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

const DEV_JWT_SECRET: &str = "vitrine-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Shared secret the identity service signs tokens with
    pub jwt_secret: String,

    /// Longest access token lifetime accepted, in seconds
    pub jwt_access_lifetime_secs: i64,

    /// Allowed CORS origin. Any origin when unset.
    pub cors_origin: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });
        if jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        let config = ApiConfig {
            http_port: parse_var("VITRINE_HTTP_PORT", "8080")?,

            database_path: env::var("VITRINE_DATABASE_PATH")
                .unwrap_or_else(|_| "./data/vitrine.db".to_string()),

            db_max_connections: parse_var("VITRINE_DB_MAX_CONNECTIONS", "5")?,

            jwt_secret,

            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", "3600")?, // 1 hour

            cors_origin: env::var("VITRINE_CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "VITRINE_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_ACCESS_LIFETIME_SECS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Configuration for tests: in-memory friendly, fixed secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        ApiConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            cors_origin: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default() {
        let port: u16 = parse_var("VITRINE_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        let err = parse_var::<u16>("VITRINE_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "VITRINE_TEST_UNSET_PORT"));
    }
}
