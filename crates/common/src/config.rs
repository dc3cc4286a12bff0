//! Configuration parsing helpers shared by Course Management components.
//!
//! Lifetimes are accepted in the compact form used by the deployment
//! environment files: a positive integer followed by an optional unit
//! suffix (`s`, `m`, `h`, `d`). A bare integer is read as seconds.

use thiserror::Error;

/// Errors produced while parsing a lifetime string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifetimeParseError {
    /// The value was empty or whitespace only.
    #[error("lifetime is empty")]
    Empty,

    /// The numeric part was missing or not a positive integer.
    #[error("invalid lifetime amount: {0}")]
    InvalidAmount(String),

    /// The unit suffix is not one of `s`, `m`, `h`, `d`.
    #[error("unknown lifetime unit: {0}")]
    UnknownUnit(String),

    /// The value does not fit in an `i64` number of seconds.
    #[error("lifetime overflows: {0}")]
    Overflow(String),
}

/// Parse a lifetime such as `"24h"`, `"7d"`, `"15m"` or `"3600"` into seconds.
///
/// # Errors
///
/// Returns a [`LifetimeParseError`] when the string is empty, the amount is
/// not a positive integer, the unit is unknown, or the result overflows.
///
/// # Example
///
/// ```rust
/// use common::config::parse_lifetime_seconds;
///
/// assert_eq!(parse_lifetime_seconds("24h"), Ok(86_400));
/// assert_eq!(parse_lifetime_seconds("90"), Ok(90));
/// ```
pub fn parse_lifetime_seconds(value: &str) -> Result<i64, LifetimeParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LifetimeParseError::Empty);
    }

    let split_at = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split_at);

    let amount: i64 = amount
        .parse()
        .map_err(|_| LifetimeParseError::InvalidAmount(value.to_string()))?;
    if amount <= 0 {
        return Err(LifetimeParseError::InvalidAmount(value.to_string()));
    }

    let multiplier: i64 = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        other => return Err(LifetimeParseError::UnknownUnit(other.to_string())),
    };

    amount
        .checked_mul(multiplier)
        .ok_or_else(|| LifetimeParseError::Overflow(value.to_string()))
}
