//! In-process [`Store`] used by tests and by local runs without Postgres.
//!
//! All state sits behind one async mutex, so every operation (including
//! seat reservation and release) is serialized.

use super::{SeatRelease, SeatReservation, Store};
use crate::errors::CmsError;
use crate::models::{
    Account, AccountCredentials, AccountRecord, Course, Enrollment, EnrollmentStatus, NewCourse,
    Progress,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: String,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredCourse {
    course: Course,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, StoredAccount>,
    courses: HashMap<Uuid, StoredCourse>,
    enrollments: HashMap<Uuid, Enrollment>,
}

impl MemoryState {
    fn live_account(&self, id: Uuid) -> Option<&StoredAccount> {
        self.accounts.get(&id).filter(|a| a.deleted_at.is_none())
    }

    fn live_account_mut(&mut self, id: Uuid) -> Option<&mut StoredAccount> {
        self.accounts.get_mut(&id).filter(|a| a.deleted_at.is_none())
    }

    fn live_account_by_email(&self, email: &str) -> Option<&StoredAccount> {
        let email = email.trim().to_lowercase();
        self.accounts
            .values()
            .find(|a| a.deleted_at.is_none() && a.account.email.to_lowercase() == email)
    }

    fn live_course_mut(&mut self, id: Uuid) -> Option<&mut StoredCourse> {
        self.courses.get_mut(&id).filter(|c| c.deleted_at.is_none())
    }

    fn enrollment_for(&self, account_id: Uuid, course_id: Uuid) -> Option<&Enrollment> {
        self.enrollments
            .values()
            .find(|e| e.account_id == account_id && e.course_id == course_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), CmsError> {
        Ok(())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, CmsError> {
        let state = self.state.lock().await;
        Ok(state.live_account(id).map(|a| a.account.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountCredentials>, CmsError> {
        let state = self.state.lock().await;
        Ok(state
            .live_account_by_email(email)
            .map(|a| AccountCredentials {
                account: a.account.clone(),
                password_hash: a.password_hash.clone(),
            }))
    }

    async fn email_in_use(&self, email: &str) -> Result<bool, CmsError> {
        let state = self.state.lock().await;
        Ok(state.live_account_by_email(email).is_some())
    }

    async fn insert_account(&self, record: AccountRecord) -> Result<Account, CmsError> {
        let mut state = self.state.lock().await;

        if state.live_account_by_email(&record.email).is_some() {
            return Err(CmsError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };

        state.accounts.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                password_hash: record.password_hash,
                deleted_at: None,
            },
        );

        Ok(account)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), CmsError> {
        let mut state = self.state.lock().await;
        if let Some(stored) = state.live_account_mut(id) {
            stored.account.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, CmsError> {
        let mut state = self.state.lock().await;
        Ok(match state.live_account_mut(id) {
            Some(stored) => {
                stored.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn set_account_active(
        &self,
        id: Uuid,
        active: bool,
    ) -> Result<Option<Account>, CmsError> {
        let mut state = self.state.lock().await;
        Ok(state.live_account_mut(id).map(|stored| {
            stored.account.is_active = active;
            stored.account.clone()
        }))
    }

    async fn soft_delete_account(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
        let mut state = self.state.lock().await;
        Ok(match state.live_account_mut(id) {
            Some(stored) => {
                stored.deleted_at = Some(at);
                stored.account.is_active = false;
                true
            }
            None => false,
        })
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, CmsError> {
        let state = self.state.lock().await;
        Ok(state
            .courses
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .map(|c| c.course.clone()))
    }

    async fn insert_course(&self, course: NewCourse) -> Result<Course, CmsError> {
        let mut state = self.state.lock().await;

        let course = Course {
            id: Uuid::new_v4(),
            name: course.name.trim().to_string(),
            description: course.description.trim().to_string(),
            duration: course.duration,
            instructor: course.instructor.trim().to_string(),
            start_date: course.start_date,
            end_date: course.end_date,
            max_students: course.max_students,
            current_students: 0,
            is_active: course.is_active,
            created_at: Utc::now(),
        };

        state.courses.insert(
            course.id,
            StoredCourse {
                course: course.clone(),
                deleted_at: None,
            },
        );

        Ok(course)
    }

    async fn soft_delete_course(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
        let mut state = self.state.lock().await;
        Ok(match state.live_course_mut(id) {
            Some(stored) => {
                stored.deleted_at = Some(at);
                stored.course.is_active = false;
                true
            }
            None => false,
        })
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, CmsError> {
        let state = self.state.lock().await;
        Ok(state.enrollments.get(&id).cloned())
    }

    async fn find_enrollment_for(
        &self,
        account_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Enrollment>, CmsError> {
        let state = self.state.lock().await;
        Ok(state.enrollment_for(account_id, course_id).cloned())
    }

    async fn reserve_seat(
        &self,
        account_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<SeatReservation, CmsError> {
        let mut state = self.state.lock().await;

        let seats = match state.live_course_mut(course_id) {
            Some(stored) if stored.course.is_active => stored.course.seats(),
            Some(_) => return Ok(SeatReservation::CourseInactive),
            None => return Ok(SeatReservation::CourseMissing),
        };

        let Ok(seats) = seats.reserve() else {
            return Ok(SeatReservation::CourseFull);
        };

        if state.enrollment_for(account_id, course_id).is_some() {
            return Ok(SeatReservation::AlreadyEnrolled);
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            account_id,
            course_id,
            status: EnrollmentStatus::Enrolled,
            enrolled_at: at,
            completed_at: None,
            progress: Progress::ZERO,
        };
        state.enrollments.insert(enrollment.id, enrollment.clone());

        if let Some(stored) = state.live_course_mut(course_id) {
            stored.course.current_students = seats.current;
        }

        Ok(SeatReservation::Reserved { enrollment, seats })
    }

    async fn release_seat(&self, enrollment_id: Uuid) -> Result<Option<SeatRelease>, CmsError> {
        let mut state = self.state.lock().await;

        let Some(enrollment) = state.enrollments.remove(&enrollment_id) else {
            return Ok(None);
        };

        let seats = match state.live_course_mut(enrollment.course_id) {
            Some(stored) => {
                let seats = stored.course.seats().release();
                stored.course.current_students = seats.current;
                seats
            }
            None => {
                tracing::warn!(
                    target: "cms.store",
                    course_id = %enrollment.course_id,
                    "Released enrollment of a deleted course; seat counter left untouched"
                );
                crate::models::SeatCount::new(0, 0)
            }
        };

        Ok(Some(SeatRelease { enrollment, seats }))
    }
}
