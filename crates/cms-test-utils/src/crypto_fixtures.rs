//! Deterministic cryptographic fixtures for testing
//!
//! Fixed HMAC secrets for both token classes, and a bcrypt cost low enough
//! to keep password tests fast.

use course_service::services::token_service::TokenService;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::time::Duration;

/// Access-token secret used by every test server.
pub const TEST_ACCESS_SECRET: &str = "test-access-secret-do-not-use-in-production-0001";

/// Refresh-token secret used by every test server.
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-do-not-use-in-production-001";

/// Minimum bcrypt cost; hashing at this cost takes about a millisecond.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_ACCESS_TTL_SECONDS: i64 = 3600;
pub const TEST_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 3600;
pub const TEST_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Token service configured with the fixed test secrets.
pub fn test_token_service() -> TokenService {
    TokenService::new(
        TEST_ACCESS_SECRET.as_bytes(),
        TEST_REFRESH_SECRET.as_bytes(),
        TEST_ACCESS_TTL_SECONDS,
        TEST_REFRESH_TTL_SECONDS,
        TEST_CLOCK_SKEW,
    )
}

/// Sign arbitrary JSON claims with HS256.
///
/// Used to forge tokens the service would never issue: wrong secret, wrong
/// token class, expired, future `iat`.
pub fn sign_test_claims(claims: &serde_json::Value, secret: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("HS256 signing of test claims should not fail")
}
