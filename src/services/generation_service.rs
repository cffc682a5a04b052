//! Generation service - pays for and schedules speech synthesis.

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::generation::{Generation, GenerationTask, NewGeneration};
use crate::models::transaction::{Status, TransactionType};
use crate::services::transaction_service;
use crate::store::Store;
use crate::worker::queue::TaskPublisher;

/// Tokens charged for `text`: two per whitespace-separated word.
pub fn count_tokens(text: &str) -> i64 {
    text.split_whitespace().count() as i64 * 2
}

/// Charge the user and queue a generation.
///
/// # Process
///
/// 1. Count tokens, create and settle a DEBIT for them
/// 2. Store a PROCESSING history row
/// 3. Publish a `GenerationTask`; on failure the row is marked FAILED
///
/// # Errors
///
/// - `InvalidRequest`: empty text
/// - `InsufficientBalance`: the DEBIT failed
/// - `QueueUnavailable`: the worker queue rejected the task
pub async fn create_generation(
    store: &dyn Store,
    publisher: &dyn TaskPublisher,
    user_id: Uuid,
    text: &str,
) -> Result<Generation, AppError> {
    let tokens = count_tokens(text);
    if tokens == 0 {
        return Err(AppError::InvalidRequest("Text must not be empty".to_string()));
    }

    let debit =
        transaction_service::create_transaction(store, user_id, tokens as f64, TransactionType::Debit)
            .await?;
    let debit = transaction_service::process_transaction(store, debit.id).await?;
    if debit.transaction_status != Status::Done {
        return Err(AppError::InsufficientBalance);
    }

    let generation = store
        .insert_generation(NewGeneration {
            id: Uuid::new_v4(),
            user_id,
            text: text.to_string(),
            tokens_spent: tokens,
        })
        .await?;

    if let Err(e) = publisher.publish(GenerationTask::new(&generation)).await {
        tracing::error!("Error sending task to queue: {}", e);
        store
            .update_generation(generation.id, Status::Failed, None)
            .await?;
        return Err(AppError::QueueUnavailable(e.to_string()));
    }

    Ok(generation)
}

/// A generation owned by `user_id`.
///
/// Generations of other users are reported as missing.
pub async fn get_generation(
    store: &dyn Store,
    generation_id: Uuid,
    user_id: Uuid,
) -> Result<Generation, AppError> {
    store
        .find_generation(generation_id)
        .await?
        .filter(|g| g.user_id == user_id)
        .ok_or(AppError::GenerationNotFound)
}

pub async fn list_generations(store: &dyn Store, user_id: Uuid) -> Result<Vec<Generation>, AppError> {
    store.list_generations(user_id).await
}

/// Location of the finished audio for a generation.
///
/// # Errors
///
/// - `GenerationNotFound`: unknown, foreign, or not DONE yet
pub async fn audio_path(
    store: &dyn Store,
    generation_id: Uuid,
    user_id: Uuid,
) -> Result<PathBuf, AppError> {
    let generation = get_generation(store, generation_id, user_id).await?;

    match (generation.status, generation.s3_link) {
        (Status::Done, Some(link)) => Ok(PathBuf::from(link)),
        _ => Err(AppError::GenerationNotFound),
    }
}
