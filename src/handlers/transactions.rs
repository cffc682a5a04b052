//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - GET /credit?amount= - Top up the balance in one step
//! - POST /transactions - Record a PROCESSING transaction
//! - GET /transactions - List own transactions
//! - GET /transactions/{id} - Get transaction details
//! - POST /transactions/{id}/process - Settle a transaction

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthContext,
    models::transaction::{CreateTransactionRequest, CreditQuery, Transaction},
    services::transaction_service,
};

/// Load a transaction and make sure the caller owns it.
///
/// Foreign transactions are reported as missing so their existence isn't leaked.
async fn owned_transaction(
    state: &AppState,
    auth: &AuthContext,
    transaction_id: Uuid,
) -> Result<Transaction, AppError> {
    transaction_service::get_transaction_by_id(state.store.as_ref(), transaction_id)
        .await?
        .filter(|t| t.user_id == auth.user_id)
        .ok_or(AppError::TransactionNotFound)
}

/// Credit the caller's balance.
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "770e8400-...",
///   "user_id": "550e8400-...",
///   "amount": 250.0,
///   "transaction_type": "CREDIT",
///   "transaction_status": "DONE",
///   "timestamp": "2025-12-21T16:00:00Z"
/// }
/// ```
pub async fn credit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<CreditQuery>,
) -> Result<Json<Transaction>, AppError> {
    let transaction =
        transaction_service::credit(state.store.as_ref(), auth.user_id, query.amount).await?;

    Ok(Json(transaction))
}

/// Record a transaction for the caller without settling it.
///
/// # Request Body
///
/// ```json
/// { "amount": 300.0, "transaction_type": "CREDIT" }
/// ```
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(request): AppJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let transaction = transaction_service::create_transaction(
        state.store.as_ref(),
        auth.user_id,
        request.amount,
        request.transaction_type,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions =
        transaction_service::get_user_transactions(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(transaction_id): AppPath<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = owned_transaction(&state, &auth, transaction_id).await?;

    Ok(Json(transaction))
}

/// Settle one of the caller's transactions.
///
/// A DEBIT larger than the balance comes back with status FAILED and HTTP 200;
/// settling an already settled transaction returns it unchanged.
pub async fn process_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(transaction_id): AppPath<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    owned_transaction(&state, &auth, transaction_id).await?;

    let transaction =
        transaction_service::process_transaction(state.store.as_ref(), transaction_id).await?;

    Ok(Json(transaction))
}
