//! Postgres-backed [`Store`].

use super::{accounts, courses, db_error, enrollments, SeatRelease, SeatReservation, Store};
use crate::errors::CmsError;
use crate::models::{Account, AccountCredentials, AccountRecord, Course, Enrollment, NewCourse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), CmsError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("Database ping failed"))?;
        Ok(())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, CmsError> {
        accounts::get_by_id(&self.pool, id).await
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountCredentials>, CmsError> {
        accounts::get_credentials_by_email(&self.pool, email).await
    }

    async fn email_in_use(&self, email: &str) -> Result<bool, CmsError> {
        accounts::email_exists(&self.pool, email).await
    }

    async fn insert_account(&self, record: AccountRecord) -> Result<Account, CmsError> {
        accounts::create_account(&self.pool, &record).await
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CmsError> {
        accounts::update_last_login(&self.pool, id, at).await
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, CmsError> {
        accounts::update_password_hash(&self.pool, id, password_hash).await
    }

    async fn set_account_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> Result<Option<Account>, CmsError> {
        accounts::set_active(&self.pool, id, active).await
    }

    async fn soft_delete_account(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
        accounts::soft_delete(&self.pool, id, at).await
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, CmsError> {
        courses::get_by_id(&self.pool, id).await
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, CmsError> {
        courses::create_course(&self.pool, &course).await
    }

    async fn soft_delete_course(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
        courses::soft_delete(&self.pool, id, at).await
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, CmsError> {
        enrollments::get_by_id(&self.pool, id).await
    }

    async fn find_enrollment_for(
        &self,
        account_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, CmsError> {
        enrollments::get_for_pair(&self.pool, account_id, course_id).await
    }

    /// Lock the course row, check capacity and duplicates, insert, bump the
    /// counter, commit. Any early return drops the transaction, which rolls
    /// it back.
    #[instrument(skip_all, name = "cms.store.reserve_seat")]
    async fn reserve_seat(
        &self,
        account_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<SeatReservation, CmsError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let locked = match courses::lock_seats(&mut tx, course_id).await? {
            Some(locked) if locked.is_active => locked,
            Some(_) => return Ok(SeatReservation::CourseInactive),
            None => return Ok(SeatReservation::CourseMissing),
        };

        let Ok(seats) = locked.seats.reserve() else {
            return Ok(SeatReservation::CourseFull);
        };

        if enrollments::get_for_pair(&mut *tx, account_id, course_id)
            .await?
            .is_some()
        {
            return Ok(SeatReservation::AlreadyEnrolled);
        }

        let enrollment = match enrollments::insert(&mut tx, account_id, course_id, at).await {
            Ok(enrollment) => enrollment,
            Err(CmsError::Conflict(_)) => return Ok(SeatReservation::AlreadyEnrolled),
            Err(e) => return Err(e),
        };

        courses::store_seats(&mut tx, course_id, seats).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit seat reservation"))?;

        Ok(SeatReservation::Reserved { enrollment, seats })
    }

    /// Lock order matches `reserve_seat`: course row first, then enrollment.
    #[instrument(skip_all, name = "cms.store.release_seat")]
    async fn release_seat(&self, enrollment_id: Uuid) -> Result<Option<SeatRelease>, CmsError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let Some(course_id) = enrollments::course_of(&mut tx, enrollment_id).await? else {
            return Ok(None);
        };

        let locked = courses::lock_seats(&mut tx, course_id).await?;

        // A concurrent release may have removed it between the two reads.
        let Some(enrollment) = enrollments::delete(&mut tx, enrollment_id).await? else {
            return Ok(None);
        };

        let seats = match locked {
            Some(locked) => {
                let seats = locked.seats.release();
                courses::store_seats(&mut tx, course_id, seats).await?;
                seats
            }
            None => {
                tracing::warn!(
                    target: "cms.store",
                    course_id = %course_id,
                    "Released enrollment of a deleted course; seat counter left untouched"
                );
                crate::models::SeatCount::new(0, 0)
            }
        };

        tx.commit()
            .await
            .map_err(db_error("Failed to commit seat release"))?;

        Ok(Some(SeatRelease { enrollment, seats }))
    }
}
