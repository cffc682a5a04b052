//! User service - registration and account views.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{CreateUserRequest, NewUser, User, UserProfile};
use crate::services::auth_service;
use crate::store::Store;

/// Tokens every new user starts with.
pub const INITIAL_BALANCE: f64 = 100.0;

pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// Check an email address.
///
/// Accepts `local@domain.tld` where the local part uses `[A-Za-z0-9._%+-]`,
/// the domain uses `[A-Za-z0-9.-]` and the final label is at least two ASCII
/// letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty()
        && host.chars().all(is_domain_char)
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn validate(request: &CreateUserRequest) -> Result<(), AppError> {
    if !is_valid_email(&request.email) {
        return Err(AppError::InvalidRequest("Invalid email format".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if request.password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes long"
        )));
    }
    Ok(())
}

/// Register a user with an initial balance of 100 tokens.
///
/// # Process
///
/// 1. Validate email and password length
/// 2. Hash the password with bcrypt at `hash_cost`
/// 3. Store user, balance and the opening CREDIT transaction atomically
///
/// # Errors
///
/// - `InvalidRequest`: malformed email, password shorter than 8 characters or
///   longer than 72 bytes
/// - `EmailTaken`: email already registered
pub async fn create_user(
    store: &dyn Store,
    request: CreateUserRequest,
    hash_cost: u32,
) -> Result<UserProfile, AppError> {
    tracing::info!("Creating new user with email: {}", request.email);
    validate(&request)?;

    let user = store
        .insert_user(NewUser {
            email: request.email,
            password_hash: auth_service::hash_password(&request.password, hash_cost)?,
            initial_balance: INITIAL_BALANCE,
        })
        .await
        .inspect_err(|e| tracing::error!("Error creating user: {}", e))?;

    tracing::info!("User created successfully with ID: {}", user.id);

    get_profile(store, user.id).await
}

pub async fn get_user(store: &dyn Store, user_id: Uuid) -> Result<User, AppError> {
    store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound)
}

/// User together with balance, transactions and generation history.
pub async fn get_profile(store: &dyn Store, user_id: Uuid) -> Result<UserProfile, AppError> {
    let user = get_user(store, user_id).await?;

    Ok(UserProfile {
        id: user.id,
        email: user.email,
        balance: store.find_balance(user_id).await?,
        transactions: store.list_transactions(user_id).await?,
        generation_history: store.list_generations(user_id).await?,
    })
}

pub async fn list_users(store: &dyn Store) -> Result<Vec<User>, AppError> {
    store.list_users().await
}

/// Delete a user and everything it owns.
pub async fn delete_user(store: &dyn Store, user_id: Uuid) -> Result<(), AppError> {
    if !store.delete_user(user_id).await? {
        return Err(AppError::UserNotFound);
    }
    tracing::info!("Deleted user {}", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in [
            "user@example.com",
            "first.last+tag@sub.example.org",
            "a_b%c-d@host-name.io",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "invalid-email",
            "@example.com",
            "user@",
            "user@example",
            "user@example.c",
            "user@exam ple.com",
            "user@example.c0m",
            "us er@example.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let request = CreateUserRequest {
            email: "user@example.com".to_string(),
            password: "1234567".to_string(),
        };
        assert!(matches!(validate(&request), Err(AppError::InvalidRequest(_))));

        let request = CreateUserRequest {
            password: "12345678".to_string(),
            ..request
        };
        assert!(validate(&request).is_ok());

        let request = CreateUserRequest {
            password: "x".repeat(MAX_PASSWORD_BYTES + 1),
            ..request
        };
        assert!(matches!(validate(&request), Err(AppError::InvalidRequest(_))));
    }
}
