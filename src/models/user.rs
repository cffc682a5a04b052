//! User data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing a registered user
//! - `Balance`: The user's token balance (one per user)
//! - `CreateUserRequest`: Request body for registration
//! - `UserResponse` / `UserProfile`: Response bodies returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::generation::Generation;
use crate::models::transaction::Transaction;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. The email column carries a UNIQUE constraint.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub email: String,

    /// bcrypt hash, see `services::auth_service::hash_password`
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

/// Values needed to register a user.
///
/// The store creates the user, the balance and the opening CREDIT
/// transaction of `initial_balance` in one atomic step.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub initial_balance: f64,
}

/// Token balance of a user.
///
/// Maps to the `balances` table (one row per user).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Balance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
}

/// Request body for `POST /register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "listener@example.com",
///   "password": "correct-horse"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user (the password hash is never serialized).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Full account view returned by `/register` and `/me`.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "listener@example.com",
///   "balance": { "id": "...", "user_id": "...", "amount": 100.0 },
///   "transactions": [
///     { "amount": 100.0, "transaction_type": "CREDIT", "transaction_status": "DONE", ... }
///   ],
///   "generation_history": []
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub balance: Option<Balance>,
    pub transactions: Vec<Transaction>,
    pub generation_history: Vec<Generation>,
}
