//! Integration tests for login, refresh and the bearer guard.

use chrono::Utc;
use cms_test_utils::*;
use course_service::repositories::Store;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_pair_and_profile() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;

    // Act
    let response = server.login(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;

    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], TEST_ACCESS_TTL_SECONDS);
    assert_eq!(body["account"]["email"], TEST_ADMIN_EMAIL);
    assert!(body["account"].get("password_hash").is_none());

    let access = body["access_token"].as_str().unwrap_or_default().to_string();
    access
        .assert_valid_jwt()
        .assert_for_subject(&admin.id.to_string())
        .assert_has_role("ADMIN")
        .assert_token_use("access")
        .assert_expires_in(TEST_ACCESS_TTL_SECONDS as u64);

    let refresh = body["refresh_token"].as_str().unwrap_or_default().to_string();
    refresh
        .assert_valid_jwt()
        .assert_token_use("refresh")
        .assert_expires_in(TEST_REFRESH_TTL_SECONDS as u64);

    Ok(())
}

#[tokio::test]
async fn test_login_normalizes_email_and_records_last_login() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let admin = server.seed_admin().await?;
    let before = Utc::now();

    // Act
    let response = server
        .login("  ADMIN@Example.com ", TEST_ADMIN_PASSWORD)
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let stored = server
        .store()
        .find_account(admin.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("admin disappeared"))?;
    let last_login = stored
        .last_login_at
        .ok_or_else(|| anyhow::anyhow!("last_login_at not recorded"))?;
    assert!(last_login >= before - chrono::Duration::seconds(1));

    Ok(())
}

/// Wrong password, unknown email and inactive account are indistinguishable.
#[tokio::test]
async fn test_login_failures_share_one_response() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    server.seed_admin().await?;
    let student = server.seed_student("inactive@example.com").await?;
    server.store().set_account_active(student.id, false).await?;

    let attempts = [
        (TEST_ADMIN_EMAIL, "WrongPass1!"),
        ("nobody@example.com", TEST_ADMIN_PASSWORD),
        ("inactive@example.com", TEST_STUDENT_PASSWORD),
    ];

    // Act / Assert
    let mut bodies = Vec::new();
    for (email, password) in attempts {
        let response = server.login(email, password).await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "login as {email} should fail"
        );
        bodies.push(response.json::<serde_json::Value>().await?);
    }

    let first = bodies.first().cloned().unwrap_or_default();
    for body in &bodies {
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
        assert_eq!(body, &first, "failure responses must not differ");
    }

    Ok(())
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_issues_new_pair() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let login: serde_json::Value = server
        .login("s@example.com", TEST_STUDENT_PASSWORD)
        .await?
        .json()
        .await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/api/auth/refresh", server.url()))
        .json(&json!({ "refresh_token": login["refresh_token"] }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    let access = body["access_token"].as_str().unwrap_or_default().to_string();
    access
        .assert_valid_jwt()
        .assert_for_subject(&student.id.to_string())
        .assert_has_role("STUDENT")
        .assert_token_use("access");

    Ok(())
}

#[tokio::test]
async fn test_refresh_rejects_access_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let access = server.access_token_for(&student)?;

    // Act
    let response = server
        .client()
        .post(format!("{}/api/auth/refresh", server.url()))
        .json(&json!({ "refresh_token": access }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_refresh_fails_after_account_deleted() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let login: serde_json::Value = server
        .login("s@example.com", TEST_STUDENT_PASSWORD)
        .await?
        .json()
        .await?;
    server
        .store()
        .soft_delete_account(student.id, Utc::now())
        .await?;

    // Act
    let response = server
        .client()
        .post(format!("{}/api/auth/refresh", server.url()))
        .json(&json!({ "refresh_token": login["refresh_token"] }))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

// ============================================================================
// Bearer Guard
// ============================================================================

#[tokio::test]
async fn test_me_returns_current_profile() -> Result<(), anyhow::Error> {
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let token = server.access_token_for(&student)?;

    let response = server
        .client()
        .get(format!("{}/api/auth/me", server.url()))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["id"], student.id.to_string());
    assert_eq!(body["role"], "STUDENT");

    Ok(())
}

#[tokio::test]
async fn test_forged_and_expired_tokens_are_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;

    let forged = TestTokenBuilder::new()
        .for_account(student.id)
        .signed_with("some-other-secret-that-is-long-enough-0000")
        .sign();
    let expired = TestTokenBuilder::new()
        .for_account(student.id)
        .issued_at(Utc::now().timestamp() - 7200)
        .expires_in(-3600)
        .sign();
    let refresh_as_access = TestTokenBuilder::new()
        .for_account(student.id)
        .with_token_use("refresh")
        .signed_with(TEST_REFRESH_SECRET)
        .sign();

    // Act / Assert
    for (name, token) in [
        ("forged", forged),
        ("expired", expired),
        ("refresh", refresh_as_access),
    ] {
        let response = server
            .client()
            .get(format!("{}/api/auth/me", server.url()))
            .bearer_auth(token)
            .send()
            .await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{name} token must be rejected"
        );
    }

    Ok(())
}

/// A token minted before deactivation stops working once the account is
/// inactive.
#[tokio::test]
async fn test_token_of_deactivated_account_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestCourseServer::spawn().await?;
    let student = server.seed_student("s@example.com").await?;
    let token = server.access_token_for(&student)?;
    server.store().set_account_active(student.id, false).await?;

    let response = server
        .client()
        .get(format!("{}/api/auth/me", server.url()))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
