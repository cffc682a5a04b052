//! Transaction service - Core business logic for balance movements.
//!
//! This service handles:
//! - Amount validation
//! - Creating PROCESSING transactions
//! - Settling them against the user's balance
//!
//! # Atomicity Guarantees
//!
//! Settlement is delegated to [`Store::settle_transaction`], which locks the
//! transaction and the balance together.

use uuid::Uuid;

use crate::error::AppError;
use crate::ledger;
use crate::models::transaction::{NewTransaction, Status, Transaction, TransactionType};
use crate::store::Store;

/// Record a new PROCESSING transaction for a user.
///
/// # Errors
///
/// - `InvalidRequest`: amount is zero, negative or not finite
/// - `UserNotFound`: the user doesn't exist
pub async fn create_transaction(
    store: &dyn Store,
    user_id: Uuid,
    amount: f64,
    transaction_type: TransactionType,
) -> Result<Transaction, AppError> {
    tracing::info!(
        "Creating transaction for user {}, amount: {}, type: {}",
        user_id,
        amount,
        transaction_type
    );

    if !ledger::is_valid_amount(amount) {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let transaction = store
        .insert_transaction(NewTransaction {
            user_id,
            amount,
            transaction_type,
            transaction_status: Status::Processing,
        })
        .await
        .inspect_err(|e| tracing::error!("Error creating transaction for {}: {}", user_id, e))?;

    tracing::info!("Transaction created successfully with ID: {}", transaction.id);

    Ok(transaction)
}

/// Settle a transaction against the owner's balance.
///
/// # Process
///
/// 1. Already DONE or FAILED: returned unchanged
/// 2. CREDIT: balance grows by `amount * rate`, status DONE
/// 3. DEBIT: balance shrinks by `amount`, status DONE; FAILED when the balance
///    is too small (this is a normal outcome, not an error)
///
/// # Errors
///
/// - `TransactionNotFound`: unknown id
/// - `BalanceNotFound`: owner has no balance (transaction becomes FAILED)
pub async fn process_transaction(
    store: &dyn Store,
    transaction_id: Uuid,
) -> Result<Transaction, AppError> {
    tracing::info!("Processing transaction with ID: {}", transaction_id);

    let transaction = store
        .settle_transaction(transaction_id)
        .await
        .inspect_err(|e| tracing::warn!("Processing {} failed: {}", transaction_id, e))?;

    match transaction.transaction_status {
        Status::Done => tracing::info!("Transaction {} processed successfully", transaction.id),
        Status::Failed => tracing::warn!(
            "Transaction {} failed for user {}",
            transaction.id,
            transaction.user_id
        ),
        Status::Processing => {}
    }

    Ok(transaction)
}

/// Create a CREDIT and settle it immediately (the `/credit` top-up).
pub async fn credit(store: &dyn Store, user_id: Uuid, amount: f64) -> Result<Transaction, AppError> {
    let transaction = create_transaction(store, user_id, amount, TransactionType::Credit).await?;
    process_transaction(store, transaction.id).await
}

pub async fn get_transaction_by_id(
    store: &dyn Store,
    transaction_id: Uuid,
) -> Result<Option<Transaction>, AppError> {
    tracing::debug!("Fetching transaction with ID: {}", transaction_id);
    store.find_transaction(transaction_id).await
}

pub async fn get_user_transactions(
    store: &dyn Store,
    user_id: Uuid,
) -> Result<Vec<Transaction>, AppError> {
    tracing::debug!("Fetching transactions for user: {}", user_id);
    store.list_transactions(user_id).await
}
