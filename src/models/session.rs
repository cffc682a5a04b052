//! Login session model.
//!
//! Bearer tokens are handed to the client once and stored only as SHA-256
//! hashes, the same way API keys are kept elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a session record from the database.
///
/// # Database Table
///
/// Maps to the `sessions` table with columns:
/// - `token_hash`: SHA-256 hex digest of the bearer token (primary key)
/// - `user_id`: owner of the session
/// - `expires_at`: tokens are rejected after this instant
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Form body of `POST /login` (OAuth2 password flow field names).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// The user's email
    pub username: String,
    pub password: String,
}

/// Response body of a successful login.
///
/// ```json
/// { "access_token": "9f2c...", "token_type": "bearer" }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}
