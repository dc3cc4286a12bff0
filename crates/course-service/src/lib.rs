//! Course Management Service library.
//!
//! Enrollment and access-control engine for a course catalog: password and
//! token authentication, role-based route guards, and race-free seat
//! accounting for course enrollments.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Password hashing, password policy, token signing
//! - `errors` - Error taxonomy and HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Access-control guard and HTTP metrics
//! - `models` - Domain types and pure seat accounting
//! - `repositories` - Persistence seam (Postgres and in-memory)
//! - `routes` - Router and shared state
//! - `services` - Session, enrollment and administrative operations
//! - `validation` - Input validators

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;
