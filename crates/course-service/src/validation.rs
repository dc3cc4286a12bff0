//! Input validators.
//!
//! Each validator returns every violated rule, not just the first, so
//! callers can report them all at once. An empty list means valid.

use crate::models::{NewAccount, NewCourse};

pub const MIN_NAME_PART_LENGTH: usize = 2;
pub const MIN_COURSE_NAME_LENGTH: usize = 3;
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MIN_INSTRUCTOR_LENGTH: usize = 3;
pub const MAX_DURATION: i32 = 1000;
pub const MAX_STUDENTS_LIMIT: i32 = 500;

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic shape check: `local@domain.tld` with no empty parts and no spaces.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}

/// Validate the non-secret fields of an account creation request.
///
/// Password strength is checked separately by the credential verifier.
pub fn validate_new_account(account: &NewAccount) -> Vec<String> {
    let mut violations = Vec::new();

    if !is_valid_email(account.email.trim()) {
        violations.push("Email must be a valid email address".to_string());
    }
    if account.first_name.trim().chars().count() < MIN_NAME_PART_LENGTH {
        violations.push(format!(
            "First name must be at least {MIN_NAME_PART_LENGTH} characters"
        ));
    }
    if account.last_name.trim().chars().count() < MIN_NAME_PART_LENGTH {
        violations.push(format!(
            "Last name must be at least {MIN_NAME_PART_LENGTH} characters"
        ));
    }

    violations
}

/// Validate a course creation request.
pub fn validate_new_course(course: &NewCourse) -> Vec<String> {
    let mut violations = Vec::new();

    if course.name.trim().chars().count() < MIN_COURSE_NAME_LENGTH {
        violations.push(format!(
            "Name must be at least {MIN_COURSE_NAME_LENGTH} characters"
        ));
    }
    if course.description.trim().chars().count() < MIN_DESCRIPTION_LENGTH {
        violations.push(format!(
            "Description must be at least {MIN_DESCRIPTION_LENGTH} characters"
        ));
    }
    if !(1..=MAX_DURATION).contains(&course.duration) {
        violations.push(format!("Duration must be between 1 and {MAX_DURATION}"));
    }
    if course.instructor.trim().chars().count() < MIN_INSTRUCTOR_LENGTH {
        violations.push(format!(
            "Instructor must be at least {MIN_INSTRUCTOR_LENGTH} characters"
        ));
    }
    if !(1..=MAX_STUDENTS_LIMIT).contains(&course.max_students) {
        violations.push(format!(
            "Max students must be between 1 and {MAX_STUDENTS_LIMIT}"
        ));
    }
    if let Some(end_date) = course.end_date {
        if end_date <= course.start_date {
            violations.push("End date must be after start date".to_string());
        }
    }

    violations
}
