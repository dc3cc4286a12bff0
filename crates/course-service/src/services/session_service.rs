use crate::crypto::{CredentialVerifier, TokenClaims};
use crate::errors::CmsError;
use crate::models::{Account, Identity, LoginResponse, Role, TokenPair};
use crate::observability::{hash_for_correlation, metrics};
use crate::repositories::Store;
use crate::services::token_service::TokenService;
use crate::validation::normalize_email;
use chrono::Utc;
use common::secret::SecretString;
use tracing::instrument;

/// Authenticate with email and password and issue a token pair.
///
/// Unknown email, inactive account and wrong password all yield the same
/// `InvalidCredentials`, and all three spend one bcrypt verification.
#[instrument(skip_all, name = "cms.session.login")]
pub async fn login(
    store: &dyn Store,
    verifier: &CredentialVerifier,
    tokens: &TokenService,
    email: &str,
    password: &SecretString,
) -> Result<LoginResponse, CmsError> {
    let email = normalize_email(email);
    let email_hash = hash_for_correlation(&email);

    let Some(credentials) = store.find_credentials_by_email(&email).await? else {
        verifier.verify_dummy(password).await?;
        tracing::info!(target: "cms.session", email_hash = %email_hash, "Login rejected: unknown email");
        metrics::record_login("invalid_credentials");
        return Err(CmsError::InvalidCredentials);
    };

    let password_ok = verifier.verify(password, &credentials.password_hash).await?;

    if !credentials.account.is_active {
        tracing::info!(
            target: "cms.session",
            account_id = %credentials.account.id,
            "Login rejected: account inactive"
        );
        metrics::record_login("invalid_credentials");
        return Err(CmsError::InvalidCredentials);
    }

    if !password_ok {
        tracing::info!(
            target: "cms.session",
            account_id = %credentials.account.id,
            "Login rejected: password mismatch"
        );
        metrics::record_login("invalid_credentials");
        return Err(CmsError::InvalidCredentials);
    }

    let now = Utc::now();
    store.record_login(credentials.account.id, now).await?;

    let mut account = credentials.account;
    account.last_login_at = Some(now);

    let pair = match tokens.issue_pair(&Identity::from(&account)) {
        Ok(pair) => pair,
        Err(e) => {
            metrics::record_token_issuance("password", "error");
            metrics::record_login("error");
            return Err(e);
        }
    };
    metrics::record_token_issuance("password", "success");
    metrics::record_login("success");

    tracing::info!(
        target: "cms.session",
        account_id = %account.id,
        role = %account.role,
        "Login succeeded"
    );

    Ok(LoginResponse {
        account,
        tokens: pair,
    })
}

/// Exchange a refresh token for a fresh pair.
///
/// The account is re-read so the new pair carries its current role, and a
/// deleted or deactivated account can no longer refresh.
#[instrument(skip_all, name = "cms.session.refresh")]
pub async fn refresh(
    store: &dyn Store,
    tokens: &TokenService,
    refresh_token: &str,
) -> Result<TokenPair, CmsError> {
    let claims = tokens.verify_refresh(refresh_token)?;
    let account = current_account(store, &claims).await?;

    let result = tokens.issue_pair(&Identity::from(&account));
    metrics::record_token_issuance("refresh", if result.is_ok() { "success" } else { "error" });

    tracing::debug!(target: "cms.session", account_id = %account.id, "Token pair refreshed");
    result
}

/// Current profile of the authenticated account.
pub async fn profile(store: &dyn Store, claims: &TokenClaims) -> Result<Account, CmsError> {
    current_account(store, claims).await
}

/// Re-validate that the token's subject is still a live, active administrator.
///
/// Role claims are trusted for routing only; privileged mutations call this
/// first.
pub async fn require_current_admin(
    store: &dyn Store,
    claims: &TokenClaims,
) -> Result<Account, CmsError> {
    let account = current_account(store, claims).await?;

    if account.role != Role::Admin {
        tracing::warn!(
            target: "cms.session",
            account_id = %account.id,
            "Privileged operation refused: account is no longer an administrator"
        );
        return Err(CmsError::Forbidden(
            "Administrator role required".to_string(),
        ));
    }

    Ok(account)
}

async fn current_account(store: &dyn Store, claims: &TokenClaims) -> Result<Account, CmsError> {
    let account_id = claims.account_id()?;

    match store.find_account(account_id).await? {
        Some(account) if account.is_active => Ok(account),
        _ => {
            tracing::debug!(
                target: "cms.session",
                account_id = %account_id,
                "Token subject is deleted or inactive"
            );
            Err(CmsError::InvalidToken(
                "Account is no longer active".to_string(),
            ))
        }
    }
}
