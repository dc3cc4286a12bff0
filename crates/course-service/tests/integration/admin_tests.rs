//! Integration tests for administrative account and course management.

use cms_test_utils::*;
use course_service::models::Account;
use course_service::repositories::Store;
use reqwest::StatusCode;
use serde_json::json;

struct AdminSession {
    server: TestCourseServer,
    admin: Account,
    token: String,
}

impl AdminSession {
    async fn start() -> Result<Self, anyhow::Error> {
        let server = TestCourseServer::spawn().await?;
        let admin = server.seed_admin().await?;
        let token = server.access_token_for(&admin)?;
        Ok(Self {
            server,
            admin,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.url(), path)
    }

    async fn create_student(&self, email: &str) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .server
            .client()
            .post(self.url("/api/users"))
            .bearer_auth(&self.token)
            .json(&json!({
                "email": email,
                "password": "Str0ng!Pass",
                "first_name": "Grace",
                "last_name": "Hopper",
            }))
            .send()
            .await?;
        Ok(response)
    }
}

// ============================================================================
// Account Management
// ============================================================================

#[tokio::test]
async fn test_create_account_defaults_to_student() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;

    // Act
    let response = session.create_student("Grace@Example.com").await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["role"], "STUDENT");
    assert_eq!(body["is_active"], true);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    // The new account can log in.
    let login = session
        .server
        .login("grace@example.com", "Str0ng!Pass")
        .await?;
    assert_eq!(login.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_create_account_duplicate_email_conflicts() -> Result<(), anyhow::Error> {
    let session = AdminSession::start().await?;
    session.create_student("dup@example.com").await?;

    let response = session.create_student("DUP@example.com").await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "CONFLICT");

    Ok(())
}

#[tokio::test]
async fn test_create_account_lists_every_violation() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;

    // Act
    let response = session
        .server
        .client()
        .post(session.url("/api/users"))
        .bearer_auth(&session.token)
        .json(&json!({
            "email": "not-an-email",
            "password": TEST_WEAK_PASSWORD,
            "first_name": "G",
            "last_name": "Hopper",
        }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    let violations = body["error"]["violations"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(
        violations.len() >= 4,
        "expected email, name and several password violations, got {violations:?}"
    );

    Ok(())
}

#[tokio::test]
async fn test_student_cannot_use_admin_routes() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;
    let student = session.server.seed_student("s@example.com").await?;
    let student_token = session.server.access_token_for(&student)?;

    // Act
    let response = session
        .server
        .client()
        .post(session.url("/api/users"))
        .bearer_auth(student_token)
        .json(&json!({
            "email": "other@example.com",
            "password": "Str0ng!Pass",
            "first_name": "Other",
            "last_name": "Student",
        }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_change_password_replaces_credentials() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;
    let student = session.server.seed_student("s@example.com").await?;

    // Act
    let response = session
        .server
        .client()
        .put(session.url(&format!("/api/users/{}/password", student.id)))
        .bearer_auth(&session.token)
        .json(&json!({ "password": "N3w!Password" }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let old = session
        .server
        .login("s@example.com", TEST_STUDENT_PASSWORD)
        .await?;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = session.server.login("s@example.com", "N3w!Password").await?;
    assert_eq!(new.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;
    let student = session.server.seed_student("s@example.com").await?;

    // Act
    let response = session
        .server
        .client()
        .put(session.url(&format!("/api/users/{}/status", student.id)))
        .bearer_auth(&session.token)
        .json(&json!({ "is_active": false }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["is_active"], false);

    let login = session
        .server
        .login("s@example.com", TEST_STUDENT_PASSWORD)
        .await?;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_delete_account_is_soft_and_not_repeatable() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;
    let student = session.server.seed_student("s@example.com").await?;
    let path = format!("/api/users/{}", student.id);

    // Act
    let first = session
        .server
        .client()
        .delete(session.url(&path))
        .bearer_auth(&session.token)
        .send()
        .await?;
    let second = session
        .server
        .client()
        .delete(session.url(&path))
        .bearer_auth(&session.token)
        .send()
        .await?;

    // Assert
    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert!(session.server.store().find_account(student.id).await?.is_none());

    // The email becomes available again.
    let recreate = session.create_student("s@example.com").await?;
    assert_eq!(recreate.status(), StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_delete_self() -> Result<(), anyhow::Error> {
    let session = AdminSession::start().await?;

    let response = session
        .server
        .client()
        .delete(session.url(&format!("/api/users/{}", session.admin.id)))
        .bearer_auth(&session.token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

/// A second administrator deactivated after login loses access immediately,
/// even though their token still carries the ADMIN role.
#[tokio::test]
async fn test_deactivated_admin_token_is_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;
    let other = session
        .server
        .seed_account(
            "second-admin@example.com",
            TEST_ADMIN_PASSWORD,
            course_service::models::Role::Admin,
        )
        .await?;
    let other_token = session.server.access_token_for(&other)?;
    session
        .server
        .store()
        .set_account_active(other.id, false)
        .await?;

    // Act
    let response = session
        .server
        .client()
        .post(session.url("/api/courses"))
        .bearer_auth(other_token)
        .json(&json!({
            "name": "Networks",
            "description": "Packets",
            "duration": 20,
            "instructor": "Cerf",
            "start_date": "2026-01-05T09:00:00Z",
        }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

// ============================================================================
// Course Management
// ============================================================================

#[tokio::test]
async fn test_create_and_delete_course() -> Result<(), anyhow::Error> {
    // Arrange
    let session = AdminSession::start().await?;

    // Act
    let created = session
        .server
        .client()
        .post(session.url("/api/courses"))
        .bearer_auth(&session.token)
        .json(&json!({
            "name": "Operating Systems",
            "description": "Processes, memory and file systems",
            "duration": 40,
            "instructor": "Tanenbaum",
            "start_date": "2026-01-05T09:00:00Z",
            "end_date": "2026-04-05T09:00:00Z",
            "max_students": 12,
        }))
        .send()
        .await?;

    // Assert
    assert_eq!(created.status(), StatusCode::CREATED);
    let course: serde_json::Value = created.json().await?;
    assert_eq!(course["current_students"], 0);
    assert_eq!(course["max_students"], 12);
    assert_eq!(course["is_active"], true);

    let id = course["id"].as_str().unwrap_or_default().to_string();
    let deleted = session
        .server
        .client()
        .delete(session.url(&format!("/api/courses/{id}")))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let again = session
        .server
        .client()
        .delete(session.url(&format!("/api/courses/{id}")))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_create_course_rejects_end_before_start() -> Result<(), anyhow::Error> {
    let session = AdminSession::start().await?;

    let response = session
        .server
        .client()
        .post(session.url("/api/courses"))
        .bearer_auth(&session.token)
        .json(&json!({
            "name": "Backwards",
            "description": "Ends before it starts",
            "duration": 5,
            "instructor": "Nobody",
            "start_date": "2026-04-05T09:00:00Z",
            "end_date": "2026-01-05T09:00:00Z",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
