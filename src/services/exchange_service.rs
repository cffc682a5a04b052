//! Exchange rate service.

use crate::error::AppError;
use crate::models::exchange::ExchangeRate;
use crate::store::Store;

/// Create the singleton record on first start; later starts keep the stored rate.
pub async fn init_exchange_rate(
    store: &dyn Store,
    default_rate: f64,
) -> Result<ExchangeRate, AppError> {
    let record = store.ensure_exchange_rate(default_rate).await?;
    tracing::info!("Exchange rate ready: {}", record.rate);
    Ok(record)
}

pub async fn get_exchange_rate(store: &dyn Store) -> Result<ExchangeRate, AppError> {
    tracing::debug!("Fetching exchange rate");
    store
        .find_exchange_rate()
        .await?
        .ok_or(AppError::ExchangeRateNotFound)
}

/// Replace the rate.
///
/// # Errors
///
/// - `InvalidRequest`: rate is not a positive finite number
/// - `ExchangeRateNotFound`: the record was never initialized
pub async fn update_exchange_rate(store: &dyn Store, rate: f64) -> Result<ExchangeRate, AppError> {
    tracing::info!("Updating exchange rate to: {}", rate);

    if !(rate.is_finite() && rate > 0.0) {
        return Err(AppError::InvalidRequest(
            "Exchange rate must be positive".to_string(),
        ));
    }

    store
        .update_exchange_rate(rate)
        .await?
        .ok_or(AppError::ExchangeRateNotFound)
}

/// Tokens bought by `amount` at the current rate.
pub async fn convert_to_tokens(store: &dyn Store, amount: f64) -> Result<f64, AppError> {
    Ok(get_exchange_rate(store).await?.convert(amount))
}
