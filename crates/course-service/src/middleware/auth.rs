//! Access-control guard for protected routes.
//!
//! `Unauthenticated -> Authenticated -> Authorized`:
//! - `require_auth` verifies the bearer access token and injects its
//!   `TokenClaims` into request extensions (401 on failure).
//! - `require_admin` additionally requires the `ADMIN` role claim (403 when
//!   authenticated but not permitted).
//!
//! The guard does no persistence lookups. Mutating operations re-validate the
//! caller's current account state themselves.

use crate::crypto::TokenClaims;
use crate::errors::CmsError;
use crate::models::Role;
use crate::services::token_service::TokenService;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

fn extract_bearer_token(req: &Request) -> Result<&str, CmsError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "cms.middleware.auth", "Missing Authorization header");
            CmsError::Unauthenticated("Missing Authorization header".to_string())
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "cms.middleware.auth", "Invalid Authorization header format");
            CmsError::Unauthenticated("Invalid Authorization header format".to_string())
        })
}

fn authenticate(state: &AuthState, req: &Request) -> Result<TokenClaims, CmsError> {
    let token = extract_bearer_token(req)?;
    state.tokens.verify_access(token)
}

/// Require a valid access token.
#[instrument(skip_all, name = "cms.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, CmsError> {
    let claims = authenticate(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Require a valid access token carrying the `ADMIN` role.
#[instrument(skip_all, name = "cms.middleware.admin")]
pub async fn require_admin(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, CmsError> {
    let claims = authenticate(&state, &req)?;

    if claims.role != Role::Admin {
        tracing::debug!(
            target: "cms.middleware.auth",
            role = %claims.role,
            "Admin route refused"
        );
        return Err(CmsError::Forbidden(
            "Administrator role required".to_string(),
        ));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
