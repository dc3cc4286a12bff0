//! Password hashing, password policy and token signing primitives.

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::CmsError;
use crate::models::Role;
use crate::observability::metrics::record_bcrypt_duration;
use common::jwt::{precheck_token, validate_iat};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::instrument;

// ============================================================================
// Password policy
// ============================================================================

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the symbol requirement.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Outcome of a password strength check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrengthReport {
    pub violations: Vec<String>,
}

impl StrengthReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a `ValidationFailed` error when any rule is violated.
    pub fn into_result(self) -> Result<(), CmsError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CmsError::ValidationFailed(self.violations))
        }
    }
}

/// Check a plaintext password against every strength rule.
pub fn validate_strength(plaintext: &str) -> StrengthReport {
    let mut violations = Vec::new();

    if plaintext.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if !plaintext.chars().any(|c| c.is_uppercase()) {
        violations.push("Password must contain at least one uppercase letter".to_string());
    }
    if !plaintext.chars().any(|c| c.is_lowercase()) {
        violations.push("Password must contain at least one lowercase letter".to_string());
    }
    if !plaintext.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Password must contain at least one number".to_string());
    }
    if !plaintext.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        violations.push("Password must contain at least one special character".to_string());
    }

    StrengthReport { violations }
}

// ============================================================================
// Credential verifier
// ============================================================================

/// Hashes and verifies passwords with bcrypt.
///
/// Hashing and verification run on the blocking thread pool so a slow hash
/// never stalls unrelated requests. A dummy hash of the configured cost is
/// kept so that logins for unknown emails spend the same time verifying.
#[derive(Clone)]
pub struct CredentialVerifier {
    cost: u32,
    dummy_hash: String,
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    /// Create a verifier with the given bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns `CmsError::Crypto` if the cost is outside
    /// `MIN_BCRYPT_COST..=MAX_BCRYPT_COST` or the dummy hash cannot be built.
    pub fn new(cost: u32) -> Result<Self, CmsError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(CmsError::Crypto(format!(
                "Invalid bcrypt cost: {} (must be {}-{})",
                cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        let dummy_hash = bcrypt::hash("timing-equalization-placeholder", cost)
            .map_err(|e| CmsError::Crypto(format!("Dummy hash generation failed: {}", e)))?;

        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Every call produces a different salt.
    #[instrument(skip_all)]
    pub async fn hash(&self, plaintext: &SecretString) -> Result<String, CmsError> {
        let plaintext = plaintext.clone();
        let cost = self.cost;
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext.expose_secret(), cost))
            .await
            .map_err(|e| {
                tracing::error!(target: "cms.crypto", error = %e, "bcrypt hash task failed");
                CmsError::Internal
            })?;

        record_bcrypt_duration("hash", start.elapsed());
        result.map_err(|e| CmsError::Crypto(format!("Password hashing failed: {}", e)))
    }

    /// Verify a plaintext password against a stored bcrypt hash.
    ///
    /// Returns `Ok(false)` on mismatch. Only a malformed hash is an error.
    #[instrument(skip_all)]
    pub async fn verify(&self, plaintext: &SecretString, hash: &str) -> Result<bool, CmsError> {
        let plaintext = plaintext.clone();
        let hash = hash.to_string();
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext.expose_secret(), &hash))
            .await
            .map_err(|e| {
                tracing::error!(target: "cms.crypto", error = %e, "bcrypt verify task failed");
                CmsError::Internal
            })?;

        record_bcrypt_duration("verify", start.elapsed());
        result.map_err(|e| CmsError::Crypto(format!("Password verification failed: {}", e)))
    }

    /// Burn one verification against the dummy hash. Always yields `false`.
    pub async fn verify_dummy(&self, plaintext: &SecretString) -> Result<bool, CmsError> {
        self.verify(plaintext, &self.dummy_hash).await.map(|_| false)
    }

    pub fn validate_strength(&self, plaintext: &SecretString) -> StrengthReport {
        validate_strength(plaintext.expose_secret())
    }
}

// ============================================================================
// Token claims and signing
// ============================================================================

/// Which secret class a token was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

impl TokenUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenUse::Access => "access",
            TokenUse::Refresh => "refresh",
        }
    }
}

/// Claims carried by access and refresh tokens.
///
/// `sub`, `email` and `jti` are redacted in Debug output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account UUID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub token_use: TokenUse,
    pub iat: i64,
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("role", &self.role)
            .field("token_use", &self.token_use)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &"[REDACTED]")
            .finish()
    }
}

impl TokenClaims {
    /// Parse the subject as an account id.
    pub fn account_id(&self) -> Result<uuid::Uuid, CmsError> {
        uuid::Uuid::parse_str(&self.sub)
            .map_err(|_| CmsError::InvalidToken("The token is invalid or expired".to_string()))
    }
}

/// HMAC key pair for one token class.
#[derive(Clone)]
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeys([REDACTED])")
    }
}

/// Sign claims with HS256.
#[instrument(skip_all)]
pub fn sign_token(claims: &TokenClaims, keys: &SigningKeys) -> Result<String, CmsError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &keys.encoding)
        .map_err(|e| CmsError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify an HS256 token and return its claims.
///
/// Validates, in order: size and structure, signature, expiry (with
/// `clock_skew` leeway), expected `token_use`, and `iat` not in the future.
/// Every failure yields the same `InvalidToken` message.
#[instrument(skip_all)]
pub fn verify_token(
    token: &str,
    keys: &SigningKeys,
    expected_use: TokenUse,
    clock_skew: Duration,
) -> Result<TokenClaims, CmsError> {
    let invalid = || CmsError::InvalidToken("The token is invalid or expired".to_string());

    precheck_token(token).map_err(|_| invalid())?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = clock_skew.as_secs();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<TokenClaims>(token, &keys.decoding, &validation).map_err(|e| {
        tracing::debug!(target: "cms.crypto", error = %e, "Token verification failed");
        invalid()
    })?;

    if token_data.claims.token_use != expected_use {
        tracing::debug!(
            target: "cms.crypto",
            expected = expected_use.as_str(),
            actual = token_data.claims.token_use.as_str(),
            "Token rejected: wrong token class"
        );
        return Err(invalid());
    }

    validate_iat(token_data.claims.iat, clock_skew).map_err(|_| invalid())?;

    Ok(token_data.claims)
}
