//! Persistence seam.
//!
//! Services depend only on the [`Store`] trait. [`PgStore`] backs it with
//! Postgres; [`MemoryStore`] keeps everything in process for tests and local
//! runs.
//!
//! Soft-deleted accounts and courses are invisible to every lookup.

pub mod accounts;
pub mod courses;
pub mod enrollments;
pub mod memory;
pub mod postgres;

use crate::errors::CmsError;
use crate::models::{
    Account, AccountCredentials, AccountRecord, Course, Enrollment, NewCourse, SeatCount,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of an atomic seat reservation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SeatReservation {
    /// Enrollment created and the course counter incremented.
    Reserved {
        enrollment: Enrollment,
        seats: SeatCount,
    },
    /// The course had no remaining seat when its row was locked.
    CourseFull,
    /// An enrollment already links this account and course.
    AlreadyEnrolled,
    /// The course is missing or soft-deleted.
    CourseMissing,
    /// The course exists but is not active.
    CourseInactive,
}

/// Result of a successful seat release.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatRelease {
    pub enrollment: Enrollment,
    pub seats: SeatCount,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe of the backing store.
    async fn ping(&self) -> Result<(), CmsError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, CmsError>;

    /// Look up an account and its password hash by normalized email.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountCredentials>, CmsError>;

    async fn email_in_use(&self, email: &str) -> Result<bool, CmsError>;

    /// Insert an account. A duplicate email yields `CmsError::Conflict`.
    async fn insert_account(&self, record: AccountRecord) -> Result<Account, CmsError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CmsError>;

    /// Replace the password hash. Returns `false` if the account is absent.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, CmsError>;

    async fn set_account_active(&self, id: Uuid, active: bool)
        -> Result<Option<Account>, CmsError>;

    /// Soft-delete: set `deleted_at` and clear the active flag.
    async fn soft_delete_account(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError>;

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, CmsError>;

    async fn insert_course(&self, course: NewCourse) -> Result<Course, CmsError>;

    async fn soft_delete_course(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError>;

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, CmsError>;

    async fn find_enrollment_for(
        &self,
        account_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, CmsError>;

    /// Atomically take a seat and create the enrollment.
    ///
    /// The capacity check, duplicate check, insert and counter increment are
    /// serialized per course.
    async fn reserve_seat(
        &self,
        account_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<SeatReservation, CmsError>;

    /// Atomically remove the enrollment and give its seat back.
    ///
    /// Returns `None` if the enrollment does not exist.
    async fn release_seat(&self, enrollment_id: Uuid) -> Result<Option<SeatRelease>, CmsError>;
}

/// Map a sqlx error into a `CmsError::Database` with context.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> CmsError {
    move |e| CmsError::Database(format!("{}: {}", context, e))
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
