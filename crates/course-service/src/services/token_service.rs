use crate::config::Config;
use crate::crypto::{self, SigningKeys, TokenClaims, TokenUse};
use crate::errors::CmsError;
use crate::models::{Identity, TokenPair};
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// Issues and verifies access/refresh token pairs.
///
/// Each token class has its own HMAC secret, so a leaked refresh secret cannot
/// mint access tokens and an access token never verifies as a refresh token.
#[derive(Clone)]
pub struct TokenService {
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    clock_skew: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("clock_skew", &self.clock_skew)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
        clock_skew: Duration,
    ) -> Self {
        Self {
            access_keys: SigningKeys::from_secret(access_secret),
            refresh_keys: SigningKeys::from_secret(refresh_secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
            clock_skew,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let (access, refresh) = config.token_secrets();
        Self::new(
            access.as_bytes(),
            refresh.as_bytes(),
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
            Duration::from_secs(config.jwt_clock_skew_seconds.unsigned_abs()),
        )
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    /// Issue an access/refresh pair for `identity`, valid from now.
    #[instrument(skip_all)]
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, CmsError> {
        self.issue_pair_at(identity, Utc::now())
    }

    /// Issue a pair as if the current time were `now`.
    #[instrument(skip_all)]
    pub fn issue_pair_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, CmsError> {
        let iat = now.timestamp();

        let access_claims = claims_for(identity, TokenUse::Access, iat, self.access_ttl_seconds)?;
        let refresh_claims =
            claims_for(identity, TokenUse::Refresh, iat, self.refresh_ttl_seconds)?;

        let access_token = crypto::sign_token(&access_claims, &self.access_keys)?;
        let refresh_token = crypto::sign_token(&refresh_claims, &self.refresh_keys)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.access_ttl_seconds,
        })
    }

    #[instrument(skip_all)]
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, CmsError> {
        self.verify(token, TokenUse::Access, &self.access_keys)
    }

    #[instrument(skip_all)]
    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, CmsError> {
        self.verify(token, TokenUse::Refresh, &self.refresh_keys)
    }

    fn verify(
        &self,
        token: &str,
        token_use: TokenUse,
        keys: &SigningKeys,
    ) -> Result<TokenClaims, CmsError> {
        let result = crypto::verify_token(token, keys, token_use, self.clock_skew);
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_token_validation(token_use.as_str(), status);
        result
    }
}

fn claims_for(
    identity: &Identity,
    token_use: TokenUse,
    iat: i64,
    ttl_seconds: i64,
) -> Result<TokenClaims, CmsError> {
    let exp = iat.checked_add(ttl_seconds).ok_or_else(|| {
        CmsError::Crypto(format!(
            "{} token expiry overflows: iat={} ttl={}",
            token_use.as_str(),
            iat,
            ttl_seconds
        ))
    })?;

    Ok(TokenClaims {
        sub: identity.account_id.to_string(),
        email: identity.email.clone(),
        role: identity.role,
        token_use,
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
    })
}
