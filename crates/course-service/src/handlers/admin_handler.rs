//! Admin-only account and course handlers.
//!
//! Routed behind `require_admin`; the services re-check the caller's current
//! account state before mutating anything.

use crate::crypto::TokenClaims;
use crate::errors::CmsError;
use crate::models::{Account, Course, NewAccount, NewCourse};
use crate::routes::AppState;
use crate::services::{account_service, catalog_service};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use common::secret::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::observe;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

/// POST /api/users
pub async fn handle_create_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiJson(payload): ApiJson<NewAccount>,
) -> Result<(StatusCode, Json<Account>), CmsError> {
    let account =
        account_service::create_account(state.store.as_ref(), &state.verifier, &claims, payload)
            .await;

    observe("create_account", account).map(|a| (StatusCode::CREATED, Json(a)))
}

/// PUT /api/users/:id/password
pub async fn handle_change_password(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiPath(account_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, CmsError> {
    let result = account_service::change_password(
        state.store.as_ref(),
        &state.verifier,
        &claims,
        account_id,
        &payload.password,
    )
    .await;

    observe("change_password", result).map(|()| StatusCode::NO_CONTENT)
}

/// PUT /api/users/:id/status
pub async fn handle_set_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiPath(account_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<SetStatusRequest>,
) -> Result<Json<Account>, CmsError> {
    let account = account_service::set_account_active(
        state.store.as_ref(),
        &claims,
        account_id,
        payload.is_active,
    )
    .await;

    observe("set_account_active", account).map(Json)
}

/// DELETE /api/users/:id
pub async fn handle_delete_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiPath(account_id): ApiPath<Uuid>,
) -> Result<StatusCode, CmsError> {
    let result = account_service::delete_account(state.store.as_ref(), &claims, account_id).await;
    observe("delete_account", result).map(|()| StatusCode::NO_CONTENT)
}

/// POST /api/courses
pub async fn handle_create_course(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiJson(payload): ApiJson<NewCourse>,
) -> Result<(StatusCode, Json<Course>), CmsError> {
    let course = catalog_service::create_course(state.store.as_ref(), &claims, payload).await;
    observe("create_course", course).map(|c| (StatusCode::CREATED, Json(c)))
}

/// DELETE /api/courses/:id
pub async fn handle_delete_course(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<StatusCode, CmsError> {
    let result = catalog_service::delete_course(state.store.as_ref(), &claims, course_id).await;
    observe("delete_course", result).map(|()| StatusCode::NO_CONTENT)
}
