//! # CMS Test Utilities
//!
//! Shared test utilities for the Course Management Service.
//!
//! This crate provides:
//! - Fixed token secrets and a fast bcrypt cost (`crypto_fixtures`)
//! - Test data builders (`TestTokenBuilder`)
//! - Server test harness (`TestCourseServer`, backed by `MemoryStore`)
//! - Fixed test IDs and credentials
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cms_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestCourseServer::spawn().await?;
//!     let admin = server.seed_admin().await?;
//!
//!     let token = server.access_token_for(&admin)?;
//!     token.assert_valid_jwt().assert_has_role("ADMIN");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
