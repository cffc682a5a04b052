//! User and login HTTP handlers.
//!
//! This module implements:
//! - POST /register - Create a user with its starting balance
//! - POST /login - Exchange credentials for a bearer token
//! - GET /users - List registered users
//! - GET /me - Profile of the authenticated user

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    app::AppState,
    error::AppError,
    extract::{AppForm, AppJson},
    middleware::auth::AuthContext,
    models::{
        session::{LoginForm, TokenResponse},
        user::{CreateUserRequest, UserProfile, UserResponse},
    },
    services::{auth_service, user_service},
};

/// Register a new user.
///
/// # Request Body
///
/// ```json
/// { "email": "listener@example.com", "password": "correct-horse" }
/// ```
///
/// # Response
///
/// - **201 Created**: profile with balance 100 and the opening transaction
/// - **400**: invalid email, or a password shorter than 8 characters or longer than 72 bytes
/// - **409**: email already registered
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let profile =
        user_service::create_user(state.store.as_ref(), request, state.config.bcrypt_cost).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Log in with `username` (the email) and `password` as form fields.
///
/// # Response (200)
///
/// ```json
/// { "access_token": "9f2c...", "token_type": "bearer" }
/// ```
pub async fn login(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = auth_service::login(
        state.store.as_ref(),
        &form.username,
        &form.password,
        state.config.token_ttl_minutes,
    )
    .await?;

    Ok(Json(token))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user_service::list_users(state.store.as_ref()).await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Profile of the caller: balance, transactions and generation history.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = user_service::get_profile(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(profile))
}
