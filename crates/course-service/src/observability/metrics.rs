//! Metrics definitions for the course service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `cms_` prefix for Course Management Service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: fixed per metric (see each function)
//! - `status`: 2 values (success, error)
//! - `error_category`: 4 values (authentication, authorization, business, internal)
//! - `operation`: bounded by code
//! - `path`: known routes, ids replaced by `{id}`, everything else `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// # Errors
///
/// Returns an error if bucket configuration fails or a recorder is already
/// installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("cms_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("cms_bcrypt".to_string()),
            &[0.010, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000],
        )
        .map_err(|e| format!("Failed to set bcrypt buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a login attempt.
///
/// Metric: `cms_login_attempts_total`
/// Labels: `outcome` (success, invalid_credentials, error)
pub fn record_login(outcome: &str) {
    counter!("cms_login_attempts_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record token pair issuance.
///
/// Metric: `cms_token_issuance_total`
/// Labels: `grant` (password, refresh), `status`
pub fn record_token_issuance(grant: &str, status: &str) {
    counter!("cms_token_issuance_total", "grant" => grant.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a token verification.
///
/// Metric: `cms_token_validations_total`
/// Labels: `token_use` (access, refresh), `status`
pub fn record_token_validation(token_use: &str, status: &str) {
    counter!("cms_token_validations_total", "token_use" => token_use.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record bcrypt operation duration.
///
/// Metric: `cms_bcrypt_duration_seconds`
/// Labels: `operation` (hash, verify)
pub fn record_bcrypt_duration(operation: &str, duration: Duration) {
    histogram!("cms_bcrypt_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

// ============================================================================
// Enrollment Metrics
// ============================================================================

/// Record an enrollment decision.
///
/// Metric: `cms_enrollment_decisions_total`
/// Labels: `outcome` (enrolled, capacity_exceeded, already_enrolled,
/// not_eligible, not_found, error)
pub fn record_enrollment_decision(outcome: &str) {
    counter!("cms_enrollment_decisions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an unenrollment.
///
/// Metric: `cms_unenrollments_total`
/// Labels: `status` (success, not_found, error)
pub fn record_unenrollment(status: &str) {
    counter!("cms_unenrollments_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Admin and Error Metrics
// ============================================================================

/// Record an administrative operation.
///
/// Metric: `cms_admin_operations_total`
/// Labels: `operation`, `status`
///
/// Operations: create_account, change_password, set_account_active,
/// delete_account, create_course, delete_course
pub fn record_admin_operation(operation: &str, status: &str) {
    counter!("cms_admin_operations_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record error by category.
///
/// Metric: `cms_errors_total`
/// Labels: `operation`, `error_category`, `status_code`
pub fn record_error(operation: &str, error_category: &str, status_code: u16) {
    counter!("cms_errors_total",
        "operation" => operation.to_string(),
        "error_category" => error_category.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `cms_http_requests_total`, `cms_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("cms_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path.clone(),
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("cms_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Normalize a request path to a bounded label value.
fn normalize_path(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/api/auth/login" | "/api/auth/refresh"
        | "/api/auth/me" | "/api/users" | "/api/courses" | "/api/enrollments" => path.to_string(),
        _ => normalize_dynamic_path(path),
    }
}

/// Replace the id segment of `/api/<collection>/<uuid>[/<action>]` paths.
fn normalize_dynamic_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        ["", "api", collection @ ("users" | "courses" | "enrollments"), id] if is_uuid(id) => {
            format!("/api/{collection}/{{id}}")
        }
        ["", "api", "users", id, action @ ("password" | "status")] if is_uuid(id) => {
            format!("/api/users/{{id}}/{action}")
        }
        _ => "/other".to_string(),
    }
}

/// Check if a string matches UUID format (8-4-4-4-12 hex digits with dashes).
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }

    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}
