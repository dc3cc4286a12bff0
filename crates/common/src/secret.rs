//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for every sensitive value in the
//! Course Management services: login passwords, token signing secrets and
//! bearer tokens.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that derives
//! `Debug` and holds a `SecretString` is safe to log via `{:?}` or `tracing`.
//! The inner value is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     email: "alice@example.com".to_string(),
//!     password: SecretString::from("Hunter2!pass"),
//! };
//!
//! assert!(!format!("{req:?}").contains("Hunter2!pass"));
//! assert_eq!(req.password.expose_secret(), "Hunter2!pass");
//! ```
//!
//! With the `serde` feature of `secrecy` enabled, secrets deserialize straight
//! from request bodies, so plaintext passwords never sit in a plain `String`.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
