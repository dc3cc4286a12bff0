use crate::crypto::TokenClaims;
use crate::errors::CmsError;
use crate::models::{Account, LoginResponse, TokenPair};
use crate::routes::AppState;
use crate::services::session_service;
use axum::{extract::State, Extension, Json};
use common::secret::SecretString;
use serde::Deserialize;
use std::sync::Arc;

use super::extract::ApiJson;
use super::observe;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Handle login
///
/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, CmsError> {
    let response = session_service::login(
        state.store.as_ref(),
        &state.verifier,
        &state.tokens,
        &payload.email,
        &payload.password,
    )
    .await;

    observe("login", response).map(Json)
}

/// Handle token refresh
///
/// POST /api/auth/refresh
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, CmsError> {
    let pair =
        session_service::refresh(state.store.as_ref(), &state.tokens, &payload.refresh_token)
            .await;

    observe("refresh", pair).map(Json)
}

/// Current account profile
///
/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<Json<Account>, CmsError> {
    let account = session_service::profile(state.store.as_ref(), &claims).await;
    observe("profile", account).map(Json)
}
