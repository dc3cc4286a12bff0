//! Enrollment repository (maps to the `enrollments` table).
//!
//! ```sql
//! CREATE TABLE enrollments (
//!     id            UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     account_id    UUID NOT NULL REFERENCES accounts (id),
//!     course_id     UUID NOT NULL REFERENCES courses (id),
//!     status        TEXT NOT NULL DEFAULT 'ENROLLED'
//!                   CHECK (status IN ('ENROLLED', 'IN_PROGRESS', 'COMPLETED', 'DROPPED')),
//!     enrolled_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     completed_at  TIMESTAMPTZ,
//!     progress      NUMERIC(5, 2) NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
//!     CONSTRAINT enrollments_account_course_unique UNIQUE (account_id, course_id)
//! );
//! ```

use super::{db_error, is_unique_violation};
use crate::errors::CmsError;
use crate::models::{Enrollment, Progress};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: Uuid,
    account_id: Uuid,
    course_id: Uuid,
    status: String,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    progress_hundredths: i32,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = CmsError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let progress = Progress::from_hundredths(row.progress_hundredths).ok_or_else(|| {
            CmsError::Database(format!(
                "Enrollment progress out of range: {}",
                row.progress_hundredths
            ))
        })?;

        Ok(Enrollment {
            id: row.id,
            account_id: row.account_id,
            course_id: row.course_id,
            status: row.status.parse().map_err(CmsError::Database)?,
            enrolled_at: row.enrolled_at,
            completed_at: row.completed_at,
            progress,
        })
    }
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Enrollment>, CmsError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, EnrollmentRow>(
        r#"
        SELECT
            id, account_id, course_id, status, enrolled_at, completed_at,
            (progress * 100)::INT4 AS progress_hundredths
        FROM enrollments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(db_error("Failed to fetch enrollment"))?;

    row.map(Enrollment::try_from).transpose()
}

pub async fn get_for_pair<'e, E>(
    executor: E,
    account_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, CmsError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, EnrollmentRow>(
        r#"
        SELECT
            id, account_id, course_id, status, enrolled_at, completed_at,
            (progress * 100)::INT4 AS progress_hundredths
        FROM enrollments
        WHERE account_id = $1 AND course_id = $2
        "#,
    )
    .bind(account_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error("Failed to fetch enrollment for account and course"))?;

    row.map(Enrollment::try_from).transpose()
}

/// Insert an `ENROLLED` record with zero progress.
///
/// A second record for the same `(account_id, course_id)` pair yields
/// `CmsError::Conflict`.
pub async fn insert(
    conn: &mut PgConnection,
    account_id: Uuid,
    course_id: Uuid,
    at: DateTime<Utc>,
) -> Result<Enrollment, CmsError> {
    let row = sqlx::query_as::<_, EnrollmentRow>(
        r#"
        INSERT INTO enrollments (account_id, course_id, status, enrolled_at, progress)
        VALUES ($1, $2, 'ENROLLED', $3, 0)
        RETURNING
            id, account_id, course_id, status, enrolled_at, completed_at,
            (progress * 100)::INT4 AS progress_hundredths
        "#,
    )
    .bind(account_id)
    .bind(course_id)
    .bind(at)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CmsError::Conflict("Account is already enrolled in this course".to_string())
        } else {
            CmsError::Database(format!("Failed to create enrollment: {}", e))
        }
    })?;

    Enrollment::try_from(row)
}

/// Course an enrollment belongs to, without locking.
pub async fn course_of(conn: &mut PgConnection, id: Uuid) -> Result<Option<Uuid>, CmsError> {
    sqlx::query_scalar::<_, Uuid>("SELECT course_id FROM enrollments WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to fetch enrollment course"))
}

/// Hard-delete an enrollment, returning the removed record.
pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<Option<Enrollment>, CmsError> {
    let row = sqlx::query_as::<_, EnrollmentRow>(
        r#"
        DELETE FROM enrollments
        WHERE id = $1
        RETURNING
            id, account_id, course_id, status, enrolled_at, completed_at,
            (progress * 100)::INT4 AS progress_hundredths
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to delete enrollment"))?;

    row.map(Enrollment::try_from).transpose()
}
