//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Storage Errors**: sqlx and file-system failures
/// - **Authentication Errors**: missing tokens, wrong credentials
/// - **Resource Errors**: requested users, transactions or generations not found
/// - **Business Logic Errors**: duplicate emails, insufficient balance
/// - **Validation Errors**: invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing generated audio failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// bcrypt could not hash a password.
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Bearer token is missing, unknown or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Not authenticated")]
    Unauthorized,

    /// Login with an unknown email or a wrong password.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    /// The user exists but has no balance row.
    #[error("User balance not found")]
    BalanceNotFound,

    #[error("Generation not found")]
    GenerationNotFound,

    /// The singleton exchange-rate record has not been initialized.
    #[error("Exchange service not found")]
    ExchangeRateNotFound,

    /// Registration with an email that is already in use.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Email already registered")]
    EmailTaken,

    /// Balance is too low to pay for the requested operation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The generation task could not be handed to the worker queue.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("Task queue unavailable: {0}")]
    QueueUnavailable(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Storage failures are logged and reported as a generic 500 so that query
/// details never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::BalanceNotFound => {
                (StatusCode::NOT_FOUND, "balance_not_found", self.to_string())
            }
            AppError::GenerationNotFound => (
                StatusCode::NOT_FOUND,
                "generation_not_found",
                self.to_string(),
            ),
            AppError::ExchangeRateNotFound => (
                StatusCode::NOT_FOUND,
                "exchange_rate_not_found",
                self.to_string(),
            ),
            AppError::EmailTaken => (StatusCode::CONFLICT, "email_taken", self.to_string()),
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::QueueUnavailable(ref msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "queue_unavailable",
                msg.clone(),
            ),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::PasswordHash(ref e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_category() {
        let cases = [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::UserNotFound, StatusCode::NOT_FOUND),
            (AppError::TransactionNotFound, StatusCode::NOT_FOUND),
            (AppError::EmailTaken, StatusCode::CONFLICT),
            (AppError::InsufficientBalance, StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::QueueUnavailable("closed".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
