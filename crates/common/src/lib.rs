//! Common utilities shared across Course Management components.

#![warn(clippy::pedantic)]

/// Module for shared configuration parsing helpers
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT hygiene utilities (size limits, clock skew, iat validation)
pub mod jwt;
