//! Authentication service: password hashing, login and bearer tokens.
//!
//! # Password Storage
//!
//! bcrypt with a per-user salt; the cost factor comes from `BCRYPT_COST`.
//!
//! # Tokens
//!
//! A login hands out 32 random bytes as 64 hex characters. Only the SHA-256
//! hash of the token is stored, next to its expiry. Expired sessions are
//! removed whenever someone logs in.

use chrono::{TimeDelta, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{Session, TokenResponse};
use crate::store::Store;

/// Identity attached to authenticated requests.
///
/// Inserted into request extensions by the auth middleware and extracted by
/// handlers with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

/// Hash a password with bcrypt at `cost`.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check a password against a stored bcrypt hash.
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// SHA-256 hex digest of a bearer token, the form kept in storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Exchange email and password for a bearer token.
///
/// # Errors
///
/// - `InvalidCredentials`: unknown email or wrong password (indistinguishable)
pub async fn login(
    store: &dyn Store,
    email: &str,
    password: &str,
    ttl_minutes: i64,
) -> Result<TokenResponse, AppError> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        tracing::warn!("Failed login for {}", email);
        return Err(AppError::InvalidCredentials);
    }

    let now = Utc::now();
    let expires_at = TimeDelta::try_minutes(ttl_minutes)
        .filter(|ttl| *ttl > TimeDelta::zero())
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::InvalidRequest(format!("Token lifetime of {ttl_minutes} minutes is out of range"))
        })?;

    let purged = store.delete_expired_sessions(now).await?;
    if purged > 0 {
        tracing::debug!("Removed {} expired sessions", purged);
    }

    let token = generate_token();
    store
        .insert_session(Session {
            token_hash: hash_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at,
        })
        .await?;

    tracing::info!("User {} logged in", user.id);

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    })
}

/// Resolve a bearer token to the user it was issued to.
///
/// # Errors
///
/// - `Unauthorized`: token unknown, expired, or its user was deleted
pub async fn authenticate(store: &dyn Store, token: &str) -> Result<AuthContext, AppError> {
    let session = store
        .find_session(&hash_token(token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    if session.is_expired(Utc::now()) {
        return Err(AppError::Unauthorized);
    }

    let user = store
        .find_user(session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthContext {
        user_id: user.id,
        email: user.email,
    })
}
