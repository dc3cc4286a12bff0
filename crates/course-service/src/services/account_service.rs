//! Administrative account operations.
//!
//! Every operation first re-validates that the caller is still a live,
//! active administrator.

use crate::crypto::{CredentialVerifier, TokenClaims};
use crate::errors::CmsError;
use crate::models::{Account, AccountRecord, NewAccount};
use crate::observability::{hash_for_correlation, metrics};
use crate::repositories::Store;
use crate::services::session_service::require_current_admin;
use crate::validation::{normalize_email, validate_new_account};
use chrono::Utc;
use common::secret::SecretString;
use tracing::instrument;
use uuid::Uuid;

#[instrument(skip_all, name = "cms.accounts.create")]
pub async fn create_account(
    store: &dyn Store,
    verifier: &CredentialVerifier,
    caller: &TokenClaims,
    request: NewAccount,
) -> Result<Account, CmsError> {
    let result = async {
        require_current_admin(store, caller).await?;

        let mut violations = validate_new_account(&request);
        violations.extend(verifier.validate_strength(&request.password).violations);
        if !violations.is_empty() {
            return Err(CmsError::ValidationFailed(violations));
        }

        let email = normalize_email(&request.email);
        if store.email_in_use(&email).await? {
            tracing::info!(
                target: "cms.accounts",
                email_hash = %hash_for_correlation(&email),
                "Account creation rejected: email in use"
            );
            return Err(CmsError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = verifier.hash(&request.password).await?;

        // The store re-checks uniqueness; a concurrent insert still conflicts.
        let account = store
            .insert_account(AccountRecord {
                email,
                password_hash,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                role: request.role,
            })
            .await?;

        tracing::info!(
            target: "cms.accounts",
            account_id = %account.id,
            role = %account.role,
            "Account created"
        );
        Ok(account)
    }
    .await;

    record("create_account", &result);
    result
}

#[instrument(skip_all, name = "cms.accounts.change_password", fields(account_id = %account_id))]
pub async fn change_password(
    store: &dyn Store,
    verifier: &CredentialVerifier,
    caller: &TokenClaims,
    account_id: Uuid,
    new_password: &SecretString,
) -> Result<(), CmsError> {
    let result = async {
        require_current_admin(store, caller).await?;
        verifier.validate_strength(new_password).into_result()?;

        if store.find_account(account_id).await?.is_none() {
            return Err(account_not_found());
        }

        let password_hash = verifier.hash(new_password).await?;
        if !store.update_password_hash(account_id, &password_hash).await? {
            return Err(account_not_found());
        }

        tracing::info!(target: "cms.accounts", "Password changed");
        Ok(())
    }
    .await;

    record("change_password", &result);
    result
}

#[instrument(skip_all, name = "cms.accounts.set_active", fields(account_id = %account_id, active = active))]
pub async fn set_account_active(
    store: &dyn Store,
    caller: &TokenClaims,
    account_id: Uuid,
    active: bool,
) -> Result<Account, CmsError> {
    let result = async {
        let admin = require_current_admin(store, caller).await?;
        if admin.id == account_id && !active {
            return Err(CmsError::invalid("Administrators cannot deactivate their own account"));
        }

        let account = store
            .set_account_active(account_id, active)
            .await?
            .ok_or_else(account_not_found)?;

        tracing::info!(target: "cms.accounts", active, "Account status changed");
        Ok(account)
    }
    .await;

    record("set_account_active", &result);
    result
}

/// Soft-delete an account. Its existing tokens stop working at the next
/// re-validation.
#[instrument(skip_all, name = "cms.accounts.delete", fields(account_id = %account_id))]
pub async fn delete_account(
    store: &dyn Store,
    caller: &TokenClaims,
    account_id: Uuid,
) -> Result<(), CmsError> {
    let result = async {
        let admin = require_current_admin(store, caller).await?;
        if admin.id == account_id {
            return Err(CmsError::invalid("Administrators cannot delete their own account"));
        }

        if !store.soft_delete_account(account_id, Utc::now()).await? {
            return Err(account_not_found());
        }

        tracing::info!(target: "cms.accounts", "Account deleted");
        Ok(())
    }
    .await;

    record("delete_account", &result);
    result
}

fn account_not_found() -> CmsError {
    CmsError::NotFound("Account not found".to_string())
}

fn record<T>(operation: &str, result: &Result<T, CmsError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_admin_operation(operation, status);
}
