//! Fixed test IDs and credentials for deterministic tests

use uuid::Uuid;

// Ids that never exist in a fresh store
pub const TEST_MISSING_ACCOUNT_ID: Uuid = Uuid::from_u128(100);
pub const TEST_MISSING_COURSE_ID: Uuid = Uuid::from_u128(200);
pub const TEST_MISSING_ENROLLMENT_ID: Uuid = Uuid::from_u128(300);

// Seeded administrator
pub const TEST_ADMIN_EMAIL: &str = "admin@example.com";
pub const TEST_ADMIN_PASSWORD: &str = "AdminPass1!";

// Password used for seeded students
pub const TEST_STUDENT_PASSWORD: &str = "StudentPass1!";

// Fails every strength rule except lowercase
pub const TEST_WEAK_PASSWORD: &str = "weak";
