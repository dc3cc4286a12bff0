//! Test server harness for E2E testing
//!
//! Provides TestCourseServer for spawning real course-service instances in
//! tests. The server runs the production router over an in-memory store.

use crate::crypto_fixtures::{test_token_service, TEST_BCRYPT_COST};
use crate::test_ids::{TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, TEST_STUDENT_PASSWORD};
use chrono::Utc;
use common::secret::SecretString;
use course_service::crypto::CredentialVerifier;
use course_service::models::{Account, AccountRecord, Course, Identity, NewCourse, Role};
use course_service::observability::metrics::init_metrics_recorder;
use course_service::repositories::{MemoryStore, Store};
use course_service::routes::{self, AppState};
use course_service::services::token_service::TokenService;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the course service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_flow() -> Result<(), anyhow::Error> {
///     let server = TestCourseServer::spawn().await?;
///     server.seed_admin().await?;
///
///     let response = server.login(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestCourseServer {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    tokens: Arc<TokenService>,
    verifier: Arc<CredentialVerifier>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestCourseServer {
    /// Spawn a new test server instance with an empty store
    ///
    /// The server binds to a random available port (127.0.0.1:0) and uses
    /// the fixed test token secrets.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(test_token_service());
        let verifier = Arc::new(
            CredentialVerifier::new(TEST_BCRYPT_COST)
                .map_err(|e| anyhow::anyhow!("Failed to build credential verifier: {}", e))?,
        );

        let state = Arc::new(AppState {
            store: store.clone(),
            tokens: tokens.clone(),
            verifier: verifier.clone(),
        });

        // The global recorder can only be installed once per test process.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            tokens,
            verifier,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Direct access to the backing store, bypassing HTTP
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Insert an account directly with a hashed password
    pub async fn seed_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, anyhow::Error> {
        let password_hash = self
            .verifier
            .hash(&SecretString::from(password.to_string()))
            .await?;

        let account = self
            .store
            .insert_account(AccountRecord {
                email: email.to_string(),
                password_hash,
                first_name: "Test".to_string(),
                last_name: role.as_str().to_lowercase(),
                role,
            })
            .await?;
        Ok(account)
    }

    /// Seed the administrator with `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD`
    pub async fn seed_admin(&self) -> Result<Account, anyhow::Error> {
        self.seed_account(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, Role::Admin)
            .await
    }

    /// Seed a student with `TEST_STUDENT_PASSWORD`
    pub async fn seed_student(&self, email: &str) -> Result<Account, anyhow::Error> {
        self.seed_account(email, TEST_STUDENT_PASSWORD, Role::Student)
            .await
    }

    /// Insert an active course with the given capacity
    pub async fn seed_course(&self, max_students: i32) -> Result<Course, anyhow::Error> {
        let course = self
            .store
            .insert_course(NewCourse {
                name: format!("Test Course ({max_students} seats)"),
                description: "Seeded by the test harness".to_string(),
                duration: 10,
                instructor: "Test Instructor".to_string(),
                start_date: Utc::now(),
                end_date: None,
                max_students,
                is_active: true,
            })
            .await?;
        Ok(course)
    }

    /// Issue an access token for an account without going through login
    pub fn access_token_for(&self, account: &Account) -> Result<String, anyhow::Error> {
        let pair = self.tokens.issue_pair(&Identity::from(account))?;
        Ok(pair.access_token)
    }

    /// POST /api/auth/login
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.url()))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(response)
    }
}

impl Drop for TestCourseServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
