//! HTTP routes for the course service.
//!
//! Defines the Axum router and application state.

use crate::crypto::CredentialVerifier;
use crate::handlers::{self, admin_handler, auth_handler, enrollment_handler};
use crate::middleware::{http_metrics_middleware, require_admin, require_auth, AuthState};
use crate::repositories::Store;
use crate::services::token_service::TokenService;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub verifier: Arc<CredentialVerifier>,
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - operational, public
/// - `/api/auth/login`, `/api/auth/refresh` - public
/// - `/api/auth/me` - any authenticated account
/// - `/api/users/...`, `/api/courses/...`, `/api/enrollments/...` - admin only
///
/// Layers: TraceLayer, 30 second timeout, HTTP metrics (outermost).
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        tokens: state.tokens.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/auth/login", post(auth_handler::handle_login))
        .route("/api/auth/refresh", post(auth_handler::handle_refresh))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(auth_handler::handle_me))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/users", post(admin_handler::handle_create_account))
        .route("/api/users/:id", delete(admin_handler::handle_delete_account))
        .route(
            "/api/users/:id/password",
            put(admin_handler::handle_change_password),
        )
        .route("/api/users/:id/status", put(admin_handler::handle_set_status))
        .route("/api/courses", post(admin_handler::handle_create_course))
        .route(
            "/api/courses/:id",
            delete(admin_handler::handle_delete_course),
        )
        .route("/api/enrollments", post(enrollment_handler::handle_enroll))
        .route(
            "/api/enrollments/:id",
            delete(enrollment_handler::handle_unenroll),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_admin))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees every response)
    public_routes
        .merge(metrics_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
