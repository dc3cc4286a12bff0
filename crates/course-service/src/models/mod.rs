pub mod seats;

use chrono::{DateTime, Utc};
use common::secret::SecretString;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use seats::{SeatCount, SeatsExhausted};

/// Default seat limit for a course created without `max_students`.
pub const DEFAULT_MAX_STUDENTS: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "STUDENT" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,
    InProgress,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "ENROLLED",
            EnrollmentStatus::InProgress => "IN_PROGRESS",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Dropped => "DROPPED",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENROLLED" => Ok(EnrollmentStatus::Enrolled),
            "IN_PROGRESS" => Ok(EnrollmentStatus::InProgress),
            "COMPLETED" => Ok(EnrollmentStatus::Completed),
            "DROPPED" => Ok(EnrollmentStatus::Dropped),
            other => Err(format!("unknown enrollment status: {other}")),
        }
    }
}

/// Course progress in hundredths of a percent (0..=10000).
///
/// Serialized as a two-decimal number, e.g. `42.5` for 4250.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Progress(u16);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(10_000);

    pub fn from_hundredths(value: i32) -> Option<Self> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= Self::COMPLETE.0)
            .map(Progress)
    }

    pub fn hundredths(self) -> u16 {
        self.0
    }

    pub fn percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Serialize for Progress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.percent())
    }
}

/// Account projection returned to callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Account together with its stored password hash. Used only by login.
#[derive(Clone)]
pub struct AccountCredentials {
    pub account: Account,
    pub password_hash: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("account_id", &self.account.id)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Account creation request.
#[derive(Debug, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
}

/// Validated account ready for insertion.
#[derive(Clone)]
pub struct AccountRecord {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("email", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration: i32,
    pub instructor: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_students: i32,
    pub current_students: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn seats(&self) -> SeatCount {
        SeatCount::new(self.current_students, self.max_students)
    }
}

/// Course creation request. The enrolled-student counter is not an input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub duration: i32,
    pub instructor: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_max_students")]
    pub max_students: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_max_students() -> i32 {
    DEFAULT_MAX_STUDENTS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub account_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: Progress,
}

/// Identity carried in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email.clone(),
            role: account.role,
        }
    }
}

#[derive(Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub account: Account,
    #[serde(flatten)]
    pub tokens: TokenPair,
}
