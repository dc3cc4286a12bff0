//! Seat accounting for a single course.
//!
//! Pure state transitions over the `(current, max)` counter pair. Both store
//! implementations read the locked counter, apply one of these functions and
//! write the result back inside the same transaction.

use serde::Serialize;
use thiserror::Error;

/// Returned by [`SeatCount::reserve`] when no seat is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all {max} seats are taken")]
pub struct SeatsExhausted {
    pub max: i32,
}

/// Enrolled-student counter of a course.
///
/// Invariant: `0 <= current <= max` for every value produced by
/// [`SeatCount::reserve`] and [`SeatCount::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatCount {
    pub current: i32,
    pub max: i32,
}

impl SeatCount {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    pub fn remaining(&self) -> i32 {
        (self.max - self.current).max(0)
    }

    pub fn has_capacity(&self) -> bool {
        self.current < self.max
    }

    /// Take one seat.
    ///
    /// # Errors
    ///
    /// Returns [`SeatsExhausted`] when `current >= max`; the counter is left
    /// untouched.
    pub fn reserve(self) -> Result<Self, SeatsExhausted> {
        if !self.has_capacity() {
            return Err(SeatsExhausted { max: self.max });
        }
        Ok(Self {
            current: self.current + 1,
            max: self.max,
        })
    }

    /// Give one seat back, never going below zero.
    pub fn release(self) -> Self {
        Self {
            current: (self.current - 1).max(0),
            max: self.max,
        }
    }
}
