//! Course repository (maps to the `courses` table).
//!
//! ```sql
//! CREATE TABLE courses (
//!     id                UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name              TEXT NOT NULL,
//!     description       TEXT NOT NULL,
//!     duration          INT4 NOT NULL CHECK (duration > 0),
//!     instructor        TEXT NOT NULL,
//!     start_date        TIMESTAMPTZ NOT NULL,
//!     end_date          TIMESTAMPTZ CHECK (end_date IS NULL OR end_date > start_date),
//!     max_students      INT4 NOT NULL DEFAULT 30 CHECK (max_students > 0),
//!     current_students  INT4 NOT NULL DEFAULT 0
//!                       CHECK (current_students >= 0 AND current_students <= max_students),
//!     is_active         BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at        TIMESTAMPTZ
//! );
//! ```
//!
//! `current_students` is written only by [`store_seats`], inside the seat
//! reservation and release transactions.

use super::db_error;
use crate::errors::CmsError;
use crate::models::{Course, NewCourse, SeatCount};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Seat counter and availability of a course row held under `FOR UPDATE`.
#[derive(Debug, Clone, Copy)]
pub struct LockedSeats {
    pub seats: SeatCount,
    pub is_active: bool,
}

/// Get a live course by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Course>, CmsError> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT
            id, name, description, duration, instructor, start_date, end_date,
            max_students, current_students, is_active, created_at
        FROM courses
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error("Failed to fetch course"))
}

/// Create a course. The seat counter always starts at zero.
pub async fn create_course(pool: &PgPool, course: &NewCourse) -> Result<Course, CmsError> {
    sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (
            name, description, duration, instructor,
            start_date, end_date, max_students, current_students, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
        RETURNING
            id, name, description, duration, instructor, start_date, end_date,
            max_students, current_students, is_active, created_at
        "#,
    )
    .bind(course.name.trim())
    .bind(course.description.trim())
    .bind(course.duration)
    .bind(course.instructor.trim())
    .bind(course.start_date)
    .bind(course.end_date)
    .bind(course.max_students)
    .bind(course.is_active)
    .fetch_one(pool)
    .await
    .map_err(db_error("Failed to create course"))
}

pub async fn soft_delete(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET deleted_at = $2, is_active = FALSE
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await
    .map_err(db_error("Failed to delete course"))?;

    Ok(result.rows_affected() > 0)
}

/// Lock a live course row and read its seat counter.
///
/// Must run inside a transaction; the lock is held until commit or rollback.
pub async fn lock_seats(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<LockedSeats>, CmsError> {
    let row = sqlx::query_as::<_, (i32, i32, bool)>(
        r#"
        SELECT current_students, max_students, is_active
        FROM courses
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(db_error("Failed to lock course"))?;

    Ok(row.map(|(current, max, is_active)| LockedSeats {
        seats: SeatCount::new(current, max),
        is_active,
    }))
}

/// Write back a seat counter previously read with [`lock_seats`].
pub async fn store_seats(
    conn: &mut PgConnection,
    id: Uuid,
    seats: SeatCount,
) -> Result<(), CmsError> {
    sqlx::query(
        r#"
        UPDATE courses
        SET current_students = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(seats.current)
    .execute(conn)
    .await
    .map_err(db_error("Failed to update seat count"))?;

    Ok(())
}
