use crate::crypto::TokenClaims;
use crate::errors::CmsError;
use crate::models::Enrollment;
use crate::routes::AppState;
use crate::services::{enrollment_service, session_service};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::observe;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub account_id: Uuid,
    pub course_id: Uuid,
}

/// Enroll a student in a course
///
/// POST /api/enrollments
pub async fn handle_enroll(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiJson(payload): ApiJson<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), CmsError> {
    let result = async {
        session_service::require_current_admin(state.store.as_ref(), &claims).await?;
        enrollment_service::enroll(state.store.as_ref(), payload.account_id, payload.course_id)
            .await
    }
    .await;

    observe("enroll", result).map(|e| (StatusCode::CREATED, Json(e)))
}

/// Remove an enrollment and release its seat
///
/// DELETE /api/enrollments/:id
pub async fn handle_unenroll(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<TokenClaims>,
    ApiPath(enrollment_id): ApiPath<Uuid>,
) -> Result<StatusCode, CmsError> {
    let result = async {
        session_service::require_current_admin(state.store.as_ref(), &claims).await?;
        enrollment_service::unenroll(state.store.as_ref(), enrollment_id).await
    }
    .await;

    observe("unenroll", result).map(|()| StatusCode::NO_CONTENT)
}
