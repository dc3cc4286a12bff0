//! Integration tests for enrollment and seat accounting over HTTP.

use cms_test_utils::*;
use course_service::repositories::Store;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

async fn enroll(
    server: &TestCourseServer,
    token: &str,
    account_id: Uuid,
    course_id: Uuid,
) -> Result<reqwest::Response, anyhow::Error> {
    let response = server
        .client()
        .post(format!("{}/api/enrollments", server.url()))
        .bearer_auth(token)
        .json(&json!({ "account_id": account_id, "course_id": course_id }))
        .send()
        .await?;
    Ok(response)
}

async fn unenroll(
    server: &TestCourseServer,
    token: &str,
    enrollment_id: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    let response = server
        .client()
        .delete(format!("{}/api/enrollments/{}", server.url(), enrollment_id))
        .bearer_auth(token)
        .send()
        .await?;
    Ok(response)
}

async fn seats_taken(server: &TestCourseServer, course_id: Uuid) -> Result<i32, anyhow::Error> {
    let course = server
        .store()
        .find_course(course_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("course {course_id} missing"))?;
    Ok(course.current_students)
}

// ============================================================================
// Enroll / Unenroll
// ============================================================================

#[tokio::test]
async fn test_enroll_then_unenroll_round_trip() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let token = server.access_token_for(&admin)?;
    let student = server.seed_student("s@example.com").await?;
    let course = server.seed_course(2).await?;

    // Act
    let response = enroll(&server, &token, student.id, course.id).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["account_id"], student.id.to_string());
    assert_eq!(body["course_id"], course.id.to_string());
    assert_eq!(body["status"], "ENROLLED");
    assert_eq!(seats_taken(&server, course.id).await?, 1);

    let enrollment_id = body["id"].as_str().unwrap_or_default().to_string();
    let removed = unenroll(&server, &token, &enrollment_id).await?;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    assert_eq!(seats_taken(&server, course.id).await?, 0);

    let repeated = unenroll(&server, &token, &enrollment_id).await?;
    assert_eq!(repeated.status(), StatusCode::NOT_FOUND);
    assert_eq!(seats_taken(&server, course.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_and_full_are_distinct_conflicts() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let token = server.access_token_for(&admin)?;
    let first = server.seed_student("first@example.com").await?;
    let second = server.seed_student("second@example.com").await?;
    let third = server.seed_student("third@example.com").await?;
    let course = server.seed_course(2).await?;

    enroll(&server, &token, first.id, course.id).await?;

    // Act / Assert: a seat is still open, so the repeat is a duplicate.
    let duplicate = enroll(&server, &token, first.id, course.id).await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let duplicate: serde_json::Value = duplicate.json().await?;
    assert_eq!(duplicate["error"]["code"], "CONFLICT");
    assert_eq!(seats_taken(&server, course.id).await?, 1);

    let last_seat = enroll(&server, &token, second.id, course.id).await?;
    assert_eq!(last_seat.status(), StatusCode::CREATED);

    let full = enroll(&server, &token, third.id, course.id).await?;
    assert_eq!(full.status(), StatusCode::CONFLICT);
    let full: serde_json::Value = full.json().await?;
    assert_eq!(full["error"]["code"], "CAPACITY_EXCEEDED");

    assert_eq!(seats_taken(&server, course.id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_enroll_rejects_ineligible_targets() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let token = server.access_token_for(&admin)?;
    let student = server.seed_student("s@example.com").await?;
    let course = server.seed_course(5).await?;

    // Act / Assert
    let admin_target = enroll(&server, &token, admin.id, course.id).await?;
    assert_eq!(admin_target.status(), StatusCode::BAD_REQUEST);

    let missing_account = enroll(&server, &token, TEST_MISSING_ACCOUNT_ID, course.id).await?;
    assert_eq!(missing_account.status(), StatusCode::NOT_FOUND);

    let missing_course = enroll(&server, &token, student.id, TEST_MISSING_COURSE_ID).await?;
    assert_eq!(missing_course.status(), StatusCode::NOT_FOUND);

    let missing_enrollment =
        unenroll(&server, &token, &TEST_MISSING_ENROLLMENT_ID.to_string()).await?;
    assert_eq!(missing_enrollment.status(), StatusCode::NOT_FOUND);

    assert_eq!(seats_taken(&server, course.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_student_cannot_enroll_themselves() -> Result<(), anyhow::Error> {
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let token = server.access_token_for(&student)?;
    let course = server.seed_course(5).await?;

    let response = enroll(&server, &token, student.id, course.id).await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(seats_taken(&server, course.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_malformed_enrollment_input_uses_error_envelope() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let token = server.access_token_for(&admin)?;
    let student = server.seed_student("s@example.com").await?;

    // Act
    let bad_id = unenroll(&server, &token, "not-a-uuid").await?;
    let missing_course = server
        .client()
        .post(format!("{}/api/enrollments", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "account_id": student.id }))
        .send()
        .await?;

    // Assert
    for response in [bad_id, missing_course] {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    }

    Ok(())
}

// ============================================================================
// Concurrency
// ============================================================================

/// Ten concurrent requests for three seats: exactly three succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_enrollments_never_oversubscribe() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let token = server.access_token_for(&admin)?;
    let course = server.seed_course(3).await?;

    let mut students = Vec::new();
    for i in 0..10 {
        students.push(server.seed_student(&format!("s{i}@example.com")).await?);
    }

    // Act
    let requests = students
        .iter()
        .map(|student| enroll(&server, &token, student.id, course.id));
    let responses = futures::future::join_all(requests).await;

    // Assert
    let mut created = 0;
    let mut conflicts = 0;
    for response in responses {
        match response?.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => anyhow::bail!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 3);
    assert_eq!(conflicts, 7);
    assert_eq!(seats_taken(&server, course.id).await?, 3);

    Ok(())
}
