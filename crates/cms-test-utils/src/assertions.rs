//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued access and refresh tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub token_use: String,
    pub exp: i64,
    pub iat: i64,
}

fn decode_segment<T: for<'de> Deserialize<'de>>(token: &str, index: usize, what: &str) -> T {
    let segment = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no {what} segment"));
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT {what}: {e}"));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Failed to parse JWT {what} JSON: {e}"))
}

fn claims(token: &str) -> JwtClaims {
    decode_segment(token, 1, "payload")
}

/// Custom assertions for tokens returned by the login and refresh endpoints
///
/// # Example
/// ```rust,ignore
/// body.access_token
///     .assert_valid_jwt()
///     .assert_token_use("access")
///     .assert_has_role("ADMIN");
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a three-part HS256 JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token carries the specified role claim
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert the token class (`access` or `refresh`)
    fn assert_token_use(&self, token_use: &str) -> &Self;

    /// Assert that the token lifetime is at most the specified seconds
    fn assert_expires_in(&self, seconds: u64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: JwtHeader = decode_segment(self, 0, "header");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        if let Some(typ) = header.typ {
            assert_eq!(typ, "JWT", "Expected JWT type");
        }

        let claims = claims(self);
        assert!(claims.exp > claims.iat, "exp must be after iat");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.role, role,
            "Expected role '{}', got '{}'",
            role, claims.role
        );
        self
    }

    fn assert_token_use(&self, token_use: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.token_use, token_use,
            "Expected token_use '{}', got '{}'",
            token_use, claims.token_use
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = claims(self);
        let lifetime = claims.exp - claims.iat;
        assert!(
            lifetime > 0 && lifetime as u64 <= seconds,
            "Expected token lifetime <= {seconds}s, got {lifetime}s"
        );
        self
    }
}
