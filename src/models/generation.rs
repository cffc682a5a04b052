//! Speech generation models.
//!
//! # Generation Flow
//!
//! 1. User calls `POST /predict?text=...`
//! 2. Tokens are debited and a PROCESSING history row is stored
//! 3. A `GenerationTask` is published to the worker queue
//! 4. The worker writes the audio and marks the row DONE (or FAILED)
//! 5. The client polls `/predictions/{id}/status` and downloads the audio

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::transaction::Status;

/// Voice prompt used when a task does not carry its own description.
pub const DEFAULT_VOICE_DESCRIPTION: &str = "A female speaker delivers a slightly expressive and animated speech with a moderate speed and pitch. The recording is of very high quality, with the speaker's voice sounding clear and very close up.";

/// Represents a generation history record from the database.
///
/// Maps to the `generation_history` table. `s3_link` stays empty until the
/// worker has produced the audio file.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Generation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub tokens_spent: i64,

    #[sqlx(try_from = "String")]
    pub status: Status,

    pub s3_link: Option<String>,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub tokens_spent: i64,
}

/// Query string of `POST /predict?text=...`.
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub text: String,
}

/// Body of `GET /predictions/{id}/status`.
#[derive(Debug, Serialize)]
pub struct GenerationStatusResponse {
    pub id: Uuid,
    pub status: Status,
    pub text: String,
    pub s3_link: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub tokens_spent: i64,
}

impl From<Generation> for GenerationStatusResponse {
    fn from(generation: Generation) -> Self {
        Self {
            id: generation.id,
            status: generation.status,
            text: generation.text,
            s3_link: generation.s3_link,
            timestamp: generation.created_at,
            tokens_spent: generation.tokens_spent,
        }
    }
}

/// Message handed to the generation worker.
///
/// # Example
///
/// ```json
/// {
///   "task_id": "0b6f...",
///   "generation_id": "7d1c...",
///   "user_id": "550e...",
///   "text": "hello there",
///   "tokens_spent": 4,
///   "description": "A female speaker ...",
///   "created_at": "2025-01-15T10:30:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: Uuid,
    pub generation_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub tokens_spent: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationTask {
    pub fn new(generation: &Generation) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            generation_id: generation.id,
            user_id: generation.user_id,
            text: generation.text.clone(),
            tokens_spent: generation.tokens_spent,
            description: DEFAULT_VOICE_DESCRIPTION.to_string(),
            created_at: Utc::now(),
        }
    }
}
