//! Account repository (maps to the `accounts` table).
//!
//! ```sql
//! CREATE TABLE accounts (
//!     id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email          TEXT NOT NULL,
//!     password_hash  TEXT NOT NULL,
//!     first_name     TEXT NOT NULL,
//!     last_name      TEXT NOT NULL,
//!     role           TEXT NOT NULL CHECK (role IN ('ADMIN', 'STUDENT')),
//!     is_active      BOOLEAN NOT NULL DEFAULT TRUE,
//!     last_login_at  TIMESTAMPTZ,
//!     created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     deleted_at     TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX accounts_live_email_unique
//!     ON accounts (lower(email)) WHERE deleted_at IS NULL;
//! ```

use super::{db_error, is_unique_violation};
use crate::errors::CmsError;
use crate::models::{Account, AccountCredentials, AccountRecord};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = CmsError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse().map_err(CmsError::Database)?,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// Get a live account by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, CmsError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT
            id, email, first_name, last_name, role,
            is_active, last_login_at, created_at
        FROM accounts
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error("Failed to fetch account by id"))?;

    row.map(Account::try_from).transpose()
}

/// Get a live account with its password hash, matching email case-insensitively.
pub async fn get_credentials_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AccountCredentials>, CmsError> {
    let row = sqlx::query_as::<_, CredentialsRow>(
        r#"
        SELECT
            id, email, first_name, last_name, role,
            is_active, last_login_at, created_at, password_hash
        FROM accounts
        WHERE lower(email) = lower($1) AND deleted_at IS NULL
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(db_error("Failed to fetch account by email"))?;

    row.map(|r| {
        Ok(AccountCredentials {
            account: Account::try_from(r.account)?,
            password_hash: r.password_hash,
        })
    })
    .transpose()
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, CmsError> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM accounts
            WHERE lower(email) = lower($1) AND deleted_at IS NULL
        )
        "#,
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(db_error("Failed to check email"))
}

/// Create an account. A live account with the same email yields `Conflict`.
pub async fn create_account(pool: &PgPool, record: &AccountRecord) -> Result<Account, CmsError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        INSERT INTO accounts (email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING
            id, email, first_name, last_name, role,
            is_active, last_login_at, created_at
        "#,
    )
    .bind(&record.email)
    .bind(&record.password_hash)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(record.role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            CmsError::Conflict("An account with this email already exists".to_string())
        } else {
            CmsError::Database(format!("Failed to create account: {}", e))
        }
    })?;

    Account::try_from(row)
}

pub async fn update_last_login(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> Result<(), CmsError> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET last_login_at = $2
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await
    .map_err(db_error("Failed to update last login"))?;

    Ok(())
}

pub async fn update_password_hash(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<bool, CmsError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET password_hash = $2
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await
    .map_err(db_error("Failed to update password"))?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<Option<Account>, CmsError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        UPDATE accounts
        SET is_active = $2
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING
            id, email, first_name, last_name, role,
            is_active, last_login_at, created_at
        "#,
    )
    .bind(id)
    .bind(active)
    .fetch_optional(pool)
    .await
    .map_err(db_error("Failed to update account status"))?;

    row.map(Account::try_from).transpose()
}

pub async fn soft_delete(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> Result<bool, CmsError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET deleted_at = $2, is_active = FALSE
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await
    .map_err(db_error("Failed to delete account"))?;

    Ok(result.rows_affected() > 0)
}
