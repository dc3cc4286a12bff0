//! HTTP middleware.
//!
//! - `auth` - access-control guard for protected routes
//! - `http_metrics` - request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_admin, require_auth, AuthState};
pub use http_metrics::http_metrics_middleware;
