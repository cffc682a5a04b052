//! Exchange rate model.
//!
//! A single row in `exchange_service` converts paid-in currency into tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The singleton exchange-rate record.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ExchangeRate {
    pub id: Uuid,

    /// Tokens granted per unit of currency
    pub rate: f64,

    pub last_update: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

/// Request body for `PUT /exchange-rate`.
#[derive(Debug, Deserialize)]
pub struct UpdateExchangeRateRequest {
    pub rate: f64,
}
