//! Administrative course operations.

use crate::crypto::TokenClaims;
use crate::errors::CmsError;
use crate::models::{Course, NewCourse};
use crate::observability::metrics;
use crate::repositories::Store;
use crate::services::session_service::require_current_admin;
use crate::validation::validate_new_course;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

/// Create a course. The seat counter always starts at zero.
#[instrument(skip_all, name = "cms.catalog.create_course")]
pub async fn create_course(
    store: &dyn Store,
    caller: &TokenClaims,
    request: NewCourse,
) -> Result<Course, CmsError> {
    let result = async {
        require_current_admin(store, caller).await?;

        let violations = validate_new_course(&request);
        if !violations.is_empty() {
            return Err(CmsError::ValidationFailed(violations));
        }

        let course = store.insert_course(request).await?;
        tracing::info!(
            target: "cms.catalog",
            course_id = %course.id,
            max_students = course.max_students,
            "Course created"
        );
        Ok(course)
    }
    .await;

    metrics::record_admin_operation("create_course", status(&result));
    result
}

/// Soft-delete a course. Existing enrollments are left in place.
#[instrument(skip_all, name = "cms.catalog.delete_course", fields(course_id = %course_id))]
pub async fn delete_course(
    store: &dyn Store,
    caller: &TokenClaims,
    course_id: Uuid,
) -> Result<(), CmsError> {
    let result = async {
        require_current_admin(store, caller).await?;

        if !store.soft_delete_course(course_id, Utc::now()).await? {
            return Err(CmsError::NotFound("Course not found".to_string()));
        }

        tracing::info!(target: "cms.catalog", "Course deleted");
        Ok(())
    }
    .await;

    metrics::record_admin_operation("delete_course", status(&result));
    result
}

fn status<T>(result: &Result<T, CmsError>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}
