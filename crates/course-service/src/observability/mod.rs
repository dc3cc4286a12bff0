//! Observability for the course service.
//!
//! # Privacy by Default
//!
//! Every operation that touches credentials or tokens is instrumented with
//! `#[instrument(skip_all)]` and logs only allow-listed fields:
//! - **SAFE**: plain values (ids, roles, outcomes, seat counts)
//! - **HASHED**: SHA-256 prefix for correlation (email addresses)
//! - **NEVER**: passwords, password hashes, tokens, signing secrets

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Used for email addresses, which must be correlated across log entries
/// without being stored in plaintext. Input is lowercased first so that the
/// same mailbox always yields the same digest.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.trim().to_lowercase().as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}

/// Error categories for metrics labels (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing, invalid or expired credentials and tokens
    Authentication,
    /// Authenticated but not permitted
    Authorization,
    /// Expected business outcomes (not found, conflict, full, validation)
    Business,
    /// Persistence, cryptography and other internal failures
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Business => "business",
            ErrorCategory::Internal => "internal",
        }
    }
}
