//! Enrollment state machine: `NONE -> ENROLLED` (enroll) and back to `NONE`
//! (unenroll, hard delete).
//!
//! Preconditions are checked in a fixed order so each failure is distinct.
//! The capacity and duplicate checks are repeated inside
//! [`Store::reserve_seat`] under the course lock; the early checks here only
//! give precise errors without taking the lock.

use crate::errors::CmsError;
use crate::models::{Enrollment, Role};
use crate::observability::metrics;
use crate::repositories::{SeatReservation, Store};
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

#[instrument(skip_all, name = "cms.enrollment.enroll", fields(account_id = %account_id, course_id = %course_id))]
pub async fn enroll(
    store: &dyn Store,
    account_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, CmsError> {
    let result = try_enroll(store, account_id, course_id).await;

    let outcome = match &result {
        Ok(_) => "enrolled",
        Err(CmsError::CapacityExceeded) => "capacity_exceeded",
        Err(CmsError::Conflict(_)) => "already_enrolled",
        Err(CmsError::ValidationFailed(_)) => "not_eligible",
        Err(CmsError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    metrics::record_enrollment_decision(outcome);

    result
}

async fn try_enroll(
    store: &dyn Store,
    account_id: Uuid,
    course_id: Uuid,
) -> Result<Enrollment, CmsError> {
    let account = store
        .find_account(account_id)
        .await?
        .ok_or_else(|| CmsError::NotFound("Account not found".to_string()))?;

    if account.role != Role::Student {
        return Err(CmsError::invalid("Only students can be enrolled"));
    }
    if !account.is_active {
        return Err(CmsError::invalid("Account is not active"));
    }

    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(course_not_found)?;

    if !course.is_active {
        return Err(course_inactive());
    }
    if !course.seats().has_capacity() {
        tracing::info!(
            target: "cms.enrollment",
            max_students = course.max_students,
            "Enrollment rejected: course full"
        );
        return Err(CmsError::CapacityExceeded);
    }

    if store
        .find_enrollment_for(account_id, course_id)
        .await?
        .is_some()
    {
        return Err(already_enrolled());
    }

    let reservation = store.reserve_seat(account_id, course_id, Utc::now()).await?;
    reservation_outcome(reservation)
}

/// Map the store's locked-row decision onto the same failures the early
/// checks report.
fn reservation_outcome(reservation: SeatReservation) -> Result<Enrollment, CmsError> {
    match reservation {
        SeatReservation::Reserved { enrollment, seats } => {
            tracing::info!(
                target: "cms.enrollment",
                enrollment_id = %enrollment.id,
                current_students = seats.current,
                max_students = seats.max,
                "Enrollment created"
            );
            Ok(enrollment)
        }
        SeatReservation::CourseFull => {
            tracing::info!(
                target: "cms.enrollment",
                "Enrollment rejected: last seat taken concurrently"
            );
            Err(CmsError::CapacityExceeded)
        }
        SeatReservation::AlreadyEnrolled => Err(already_enrolled()),
        // Deleted or deactivated between the early read and the lock.
        SeatReservation::CourseMissing => Err(course_not_found()),
        SeatReservation::CourseInactive => Err(course_inactive()),
    }
}

/// Remove an enrollment and give its seat back.
///
/// Repeating the call for the same id yields `NotFound`, never a second
/// decrement.
#[instrument(skip_all, name = "cms.enrollment.unenroll", fields(enrollment_id = %enrollment_id))]
pub async fn unenroll(store: &dyn Store, enrollment_id: Uuid) -> Result<(), CmsError> {
    match store.release_seat(enrollment_id).await {
        Ok(Some(release)) => {
            metrics::record_unenrollment("success");
            tracing::info!(
                target: "cms.enrollment",
                course_id = %release.enrollment.course_id,
                current_students = release.seats.current,
                "Enrollment removed"
            );
            Ok(())
        }
        Ok(None) => {
            metrics::record_unenrollment("not_found");
            Err(CmsError::NotFound("Enrollment not found".to_string()))
        }
        Err(e) => {
            metrics::record_unenrollment("error");
            Err(e)
        }
    }
}

fn course_not_found() -> CmsError {
    CmsError::NotFound("Course not found".to_string())
}

fn course_inactive() -> CmsError {
    CmsError::invalid("Course is not active")
}

fn already_enrolled() -> CmsError {
    CmsError::Conflict("Account is already enrolled in this course".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountRecord, Course, EnrollmentStatus, NewCourse, Progress};
    use crate::repositories::MemoryStore;
    use std::sync::Arc;

    async fn seed_account(store: &MemoryStore, email: &str, role: Role) -> Account {
        store
            .insert_account(AccountRecord {
                email: email.to_string(),
                password_hash: "$2b$04$unusedunusedunusedunusedunusedunusedunusedunused".into(),
                first_name: "Seed".to_string(),
                last_name: "Account".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    async fn seed_course(store: &MemoryStore, max_students: i32) -> Course {
        store
            .insert_course(NewCourse {
                name: "Distributed Systems".to_string(),
                description: "Consensus, replication and failure".to_string(),
                duration: 30,
                instructor: "Lamport".to_string(),
                start_date: Utc::now(),
                end_date: None,
                max_students,
                is_active: true,
            })
            .await
            .unwrap()
    }

    async fn current_students(store: &MemoryStore, course_id: Uuid) -> i32 {
        store
            .find_course(course_id)
            .await
            .unwrap()
            .unwrap()
            .current_students
    }

    #[tokio::test]
    async fn test_enroll_creates_record_and_takes_seat() {
        let store = MemoryStore::new();
        let student = seed_account(&store, "s@example.com", Role::Student).await;
        let course = seed_course(&store, 5).await;

        let enrollment = enroll(&store, student.id, course.id).await.unwrap();

        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
        assert_eq!(enrollment.progress, Progress::ZERO);
        assert_eq!(enrollment.account_id, student.id);
        assert_eq!(current_students(&store, course.id).await, 1);
    }

    #[tokio::test]
    async fn test_enroll_twice_conflicts_without_second_seat() {
        let store = MemoryStore::new();
        let student = seed_account(&store, "s@example.com", Role::Student).await;
        let course = seed_course(&store, 5).await;

        enroll(&store, student.id, course.id).await.unwrap();
        let err = enroll(&store, student.id, course.id).await.unwrap_err();

        assert!(matches!(err, CmsError::Conflict(_)));
        assert_eq!(current_students(&store, course.id).await, 1);
    }

    #[tokio::test]
    async fn test_enroll_precondition_failures_are_distinct() {
        let store = MemoryStore::new();
        let student = seed_account(&store, "s@example.com", Role::Student).await;
        let admin = seed_account(&store, "a@example.com", Role::Admin).await;
        let inactive = seed_account(&store, "i@example.com", Role::Student).await;
        store.set_account_active(inactive.id, false).await.unwrap();
        let course = seed_course(&store, 5).await;

        assert!(matches!(
            enroll(&store, Uuid::new_v4(), course.id).await,
            Err(CmsError::NotFound(_))
        ));
        assert!(matches!(
            enroll(&store, admin.id, course.id).await,
            Err(CmsError::ValidationFailed(_))
        ));
        assert!(matches!(
            enroll(&store, inactive.id, course.id).await,
            Err(CmsError::ValidationFailed(_))
        ));
        assert!(matches!(
            enroll(&store, student.id, Uuid::new_v4()).await,
            Err(CmsError::NotFound(_))
        ));

        store.soft_delete_course(course.id, Utc::now()).await.unwrap();
        assert!(matches!(
            enroll(&store, student.id, course.id).await,
            Err(CmsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_enroll_full_course_is_capacity_exceeded() {
        let store = MemoryStore::new();
        let first = seed_account(&store, "first@example.com", Role::Student).await;
        let second = seed_account(&store, "second@example.com", Role::Student).await;
        let course = seed_course(&store, 1).await;

        enroll(&store, first.id, course.id).await.unwrap();
        assert!(matches!(
            enroll(&store, second.id, course.id).await,
            Err(CmsError::CapacityExceeded)
        ));
        assert_eq!(current_students(&store, course.id).await, 1);
    }

    /// Capacity is checked before duplicates: re-enrolling into a full
    /// course reports the course as full.
    #[tokio::test]
    async fn test_full_course_reports_capacity_before_duplicate() {
        let store = MemoryStore::new();
        let student = seed_account(&store, "s@example.com", Role::Student).await;
        let course = seed_course(&store, 1).await;

        enroll(&store, student.id, course.id).await.unwrap();

        assert!(matches!(
            enroll(&store, student.id, course.id).await,
            Err(CmsError::CapacityExceeded)
        ));
        assert_eq!(current_students(&store, course.id).await, 1);
    }

    #[test]
    fn test_locked_row_outcomes_match_early_checks() {
        assert!(matches!(
            reservation_outcome(SeatReservation::CourseMissing),
            Err(CmsError::NotFound(_))
        ));
        assert!(matches!(
            reservation_outcome(SeatReservation::CourseInactive),
            Err(CmsError::ValidationFailed(v)) if v == vec!["Course is not active".to_string()]
        ));
        assert!(matches!(
            reservation_outcome(SeatReservation::CourseFull),
            Err(CmsError::CapacityExceeded)
        ));
        assert!(matches!(
            reservation_outcome(SeatReservation::AlreadyEnrolled),
            Err(CmsError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_unenroll_releases_seat_once() {
        let store = MemoryStore::new();
        let student = seed_account(&store, "s@example.com", Role::Student).await;
        let course = seed_course(&store, 2).await;
        let enrollment = enroll(&store, student.id, course.id).await.unwrap();

        unenroll(&store, enrollment.id).await.unwrap();
        assert_eq!(current_students(&store, course.id).await, 0);
        assert!(store.find_enrollment(enrollment.id).await.unwrap().is_none());

        assert!(matches!(
            unenroll(&store, enrollment.id).await,
            Err(CmsError::NotFound(_))
        ));
        assert_eq!(current_students(&store, course.id).await, 0);

        // The seat is usable again.
        enroll(&store, student.id, course.id).await.unwrap();
        assert_eq!(current_students(&store, course.id).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enrollments_fill_exactly_remaining_seats() {
        let store = Arc::new(MemoryStore::new());
        let course_id = seed_course(&store, 3).await.id;

        let mut students = Vec::new();
        for i in 0..10 {
            students.push(seed_account(&store, &format!("s{i}@example.com"), Role::Student).await);
        }

        let handles: Vec<_> = students
            .into_iter()
            .map(|student| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { enroll(store.as_ref(), student.id, course_id).await })
            })
            .collect();

        let mut enrolled = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => enrolled += 1,
                Err(CmsError::CapacityExceeded) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(enrolled, 3);
        assert_eq!(rejected, 7);
        assert_eq!(current_students(&store, course_id).await, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_two_students_racing_for_last_seat() {
        let store = Arc::new(MemoryStore::new());
        let course_id = seed_course(&store, 1).await.id;
        let a = seed_account(&store, "a@example.com", Role::Student).await;
        let b = seed_account(&store, "b@example.com", Role::Student).await;

        let (ra, rb) = tokio::join!(
            {
                let store = Arc::clone(&store);
                tokio::spawn(async move { enroll(store.as_ref(), a.id, course_id).await })
            },
            {
                let store = Arc::clone(&store);
                tokio::spawn(async move { enroll(store.as_ref(), b.id, course_id).await })
            }
        );
        let results = [ra.unwrap(), rb.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(CmsError::CapacityExceeded)))
                .count(),
            1
        );
        assert_eq!(current_students(&store, course_id).await, 1);
    }
}
