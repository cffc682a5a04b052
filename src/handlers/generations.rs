//! Speech generation HTTP handlers.
//!
//! - POST /predict?text= - Pay for and queue a generation
//! - GET /predictions - Own generation history
//! - GET /predictions/{id}/status - Poll one generation
//! - GET /predictions/{id}/audio - Download the finished WAV file

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    extract::{AppPath, AppQuery},
    middleware::auth::AuthContext,
    models::generation::{Generation, GenerationStatusResponse, PredictQuery},
    services::generation_service,
};

/// Queue a generation for `text`.
///
/// # Response
///
/// - **201 Created**: the PROCESSING generation
/// - **422**: not enough tokens
/// - **503**: worker queue unavailable
pub async fn predict(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<PredictQuery>,
) -> Result<(StatusCode, Json<Generation>), AppError> {
    let generation = generation_service::create_generation(
        state.store.as_ref(),
        state.publisher.as_ref(),
        auth.user_id,
        &query.text,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(generation)))
}

pub async fn list_predictions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Generation>>, AppError> {
    let generations =
        generation_service::list_generations(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(generations))
}

/// # Response (200)
///
/// ```json
/// {
///   "id": "7d1c...",
///   "status": "DONE",
///   "text": "hello there",
///   "s3_link": "output/7d1c....wav",
///   "timestamp": "2025-01-15T10:30:00Z",
///   "tokens_spent": 4
/// }
/// ```
pub async fn prediction_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(generation_id): AppPath<Uuid>,
) -> Result<Json<GenerationStatusResponse>, AppError> {
    let generation =
        generation_service::get_generation(state.store.as_ref(), generation_id, auth.user_id)
            .await?;

    Ok(Json(generation.into()))
}

/// Stream back the WAV file once the generation is DONE.
pub async fn prediction_audio(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(generation_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let path =
        generation_service::audio_path(state.store.as_ref(), generation_id, auth.user_id).await?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            tracing::warn!("Audio file {} is missing", path.display());
            AppError::GenerationNotFound
        } else {
            AppError::Io(e)
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], bytes))
}
