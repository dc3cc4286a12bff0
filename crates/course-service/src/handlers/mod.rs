//! HTTP request handlers.

pub mod admin_handler;
pub mod auth_handler;
pub mod enrollment_handler;
pub mod extract;
pub mod health;
pub mod metrics;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;

use crate::errors::CmsError;
use crate::observability::metrics::record_error;

/// Count a failed operation by category and status before it becomes a
/// response.
pub(crate) fn observe<T>(operation: &str, result: Result<T, CmsError>) -> Result<T, CmsError> {
    if let Err(e) = &result {
        record_error(operation, e.category().as_str(), e.status_code().as_u16());
    }
    result
}
