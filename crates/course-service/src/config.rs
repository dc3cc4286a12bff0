//! Course service configuration.
//!
//! Loaded from environment variables. Token secrets are held as
//! `SecretString` and the database URL is redacted in Debug output.

use common::config::parse_lifetime_seconds;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default access token lifetime.
pub const DEFAULT_ACCESS_EXPIRES_IN: &str = "24h";

/// Default refresh token lifetime.
pub const DEFAULT_REFRESH_EXPIRES_IN: &str = "7d";

/// Longest accepted lifetime for either token class (365 days).
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 365 * 24 * 3600;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest accepted bcrypt cost. Only test deployments should go this low.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest accepted bcrypt cost.
pub const MAX_BCRYPT_COST: u32 = 16;

/// Costs below this log a warning at startup.
pub const RECOMMENDED_MIN_BCRYPT_COST: u32 = 10;

/// Minimum length of each token signing secret in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_access_secret: SecretString,
    pub jwt_refresh_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub jwt_clock_skew_seconds: i64,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("jwt_access_secret", &self.jwt_access_secret)
            .field("jwt_refresh_secret", &self.jwt_refresh_secret)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret configuration: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid token lifetime configuration: {0}")]
    InvalidTokenLifetime(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid bcrypt cost configuration: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid database pool configuration: {0}")]
    InvalidDbPool(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_access_secret = required(vars, "JWT_ACCESS_SECRET")?;
        let jwt_refresh_secret = required(vars, "JWT_REFRESH_SECRET")?;

        for (name, secret) in [
            ("JWT_ACCESS_SECRET", &jwt_access_secret),
            ("JWT_REFRESH_SECRET", &jwt_refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(ConfigError::InvalidJwtSecret(format!(
                    "{} must be at least {} bytes, got {}",
                    name,
                    MIN_SECRET_BYTES,
                    secret.len()
                )));
            }
        }

        if jwt_access_secret == jwt_refresh_secret {
            return Err(ConfigError::InvalidJwtSecret(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ".to_string(),
            ));
        }

        let access_token_ttl_seconds =
            lifetime(vars, "JWT_ACCESS_EXPIRES_IN", DEFAULT_ACCESS_EXPIRES_IN)?;
        let refresh_token_ttl_seconds =
            lifetime(vars, "JWT_REFRESH_EXPIRES_IN", DEFAULT_REFRESH_EXPIRES_IN)?;

        if refresh_token_ttl_seconds <= access_token_ttl_seconds {
            return Err(ConfigError::InvalidTokenLifetime(format!(
                "JWT_REFRESH_EXPIRES_IN ({}s) must be longer than JWT_ACCESS_EXPIRES_IN ({}s)",
                refresh_token_ttl_seconds, access_token_ttl_seconds
            )));
        }

        let max_skew = i64::try_from(MAX_CLOCK_SKEW.as_secs()).unwrap_or(i64::MAX);
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(0..=max_skew).contains(&value) {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be between 0 and {}, got {}",
                    max_skew, value
                )));
            }

            value
        } else {
            i64::try_from(DEFAULT_CLOCK_SKEW.as_secs()).unwrap_or(60)
        };

        let bcrypt_cost = if let Some(value_str) = vars.get("BCRYPT_COST") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&value) {
                return Err(ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be between {} and {}, got {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST, value
                )));
            }

            if value < RECOMMENDED_MIN_BCRYPT_COST {
                tracing::warn!(
                    target: "cms.config",
                    bcrypt_cost = value,
                    "BCRYPT_COST is below the recommended minimum of {}",
                    RECOMMENDED_MIN_BCRYPT_COST
                );
            }

            value
        } else {
            DEFAULT_BCRYPT_COST
        };

        let db_max_connections = if let Some(value_str) = vars.get("DB_MAX_CONNECTIONS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDbPool(format!(
                    "DB_MAX_CONNECTIONS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidDbPool(
                    "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_DB_MAX_CONNECTIONS
        };

        Ok(Config {
            database_url,
            bind_address,
            jwt_access_secret: SecretString::from(jwt_access_secret),
            jwt_refresh_secret: SecretString::from(jwt_refresh_secret),
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            jwt_clock_skew_seconds,
            bcrypt_cost,
            db_max_connections,
        })
    }

    /// Both token secrets, exposed for key construction only.
    pub fn token_secrets(&self) -> (&str, &str) {
        (
            self.jwt_access_secret.expose_secret(),
            self.jwt_refresh_secret.expose_secret(),
        )
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn lifetime(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<i64, ConfigError> {
    let raw = vars.get(name).map_or(default, String::as_str);
    let seconds = parse_lifetime_seconds(raw)
        .map_err(|e| ConfigError::InvalidTokenLifetime(format!("{}: {}", name, e)))?;

    if seconds > MAX_TOKEN_LIFETIME_SECONDS {
        return Err(ConfigError::InvalidTokenLifetime(format!(
            "{} must be at most {}s, got {}s",
            name, MAX_TOKEN_LIFETIME_SECONDS, seconds
        )));
    }

    Ok(seconds)
}
