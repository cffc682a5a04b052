//! Exchange rate HTTP handlers.

use axum::{Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    extract::AppJson,
    models::exchange::{ExchangeRate, UpdateExchangeRateRequest},
    services::exchange_service,
};

/// `GET /exchange-rate`
pub async fn get_exchange_rate(State(state): State<AppState>) -> Result<Json<ExchangeRate>, AppError> {
    let rate = exchange_service::get_exchange_rate(state.store.as_ref()).await?;

    Ok(Json(rate))
}

/// `PUT /exchange-rate` with `{ "rate": 1.5 }`. Requires authentication.
pub async fn update_exchange_rate(
    State(state): State<AppState>,
    AppJson(request): AppJson<UpdateExchangeRateRequest>,
) -> Result<Json<ExchangeRate>, AppError> {
    let rate = exchange_service::update_exchange_rate(state.store.as_ref(), request.rate).await?;

    Ok(Json(rate))
}
