//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating token claims, signed or unsigned.

use crate::crypto_fixtures::{sign_test_claims, TEST_ACCESS_SECRET};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

/// Builder for creating test JWT claims in the service's claim shape
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_account(account.id)
///     .with_role("ADMIN")
///     .expires_in(-120)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    email: String,
    role: String,
    token_use: String,
    exp: i64,
    iat: i64,
    secret: String,
}

impl TestTokenBuilder {
    /// Create a new builder for a student access token valid for one hour
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Uuid::new_v4().to_string(),
            email: "test-subject@example.com".to_string(),
            role: "STUDENT".to_string(),
            token_use: "access".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            secret: TEST_ACCESS_SECRET.to_string(),
        }
    }

    /// Set the subject account id
    pub fn for_account(mut self, account_id: Uuid) -> Self {
        self.sub = account_id.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    /// Set the role claim (`ADMIN` or `STUDENT`)
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    /// Set the token class claim (`access` or `refresh`)
    pub fn with_token_use(mut self, token_use: &str) -> Self {
        self.token_use = token_use.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a different secret than the test access secret
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> serde_json::Value {
        json!({
            "sub": self.sub,
            "email": self.email,
            "role": self.role,
            "token_use": self.token_use,
            "iat": self.iat,
            "exp": self.exp,
            "jti": Uuid::new_v4().to_string(),
        })
    }

    /// Build and sign the claims with HS256
    pub fn sign(self) -> String {
        sign_test_claims(&self.build(), &self.secret)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
