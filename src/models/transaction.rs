//! Transaction data models and API request types.
//!
//! This module defines:
//! - `TransactionType` / `Status`: the closed sets stored as upper-case text
//! - `Transaction`: Database entity representing a balance movement
//! - Request types for creating transactions and quick top-ups

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored enum column held a value outside the known set.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Direction of a balance movement.
///
/// - `Credit`: money paid in, converted to tokens at the current exchange rate
/// - `Debit`: tokens spent, taken from the balance as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(TransactionType::Credit),
            "DEBIT" => Ok(TransactionType::Debit),
            other => Err(ParseEnumError {
                kind: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle of a transaction or a generation.
///
/// Everything starts as `Processing` and ends in exactly one of
/// `Done` or `Failed`. Terminal records are never changed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Processing,
    Done,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Processing => "PROCESSING",
            Status::Done => "DONE",
            Status::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Processing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(Status::Processing),
            "DONE" => Ok(Status::Done),
            "FAILED" => Ok(Status::Failed),
            other => Err(ParseEnumError {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each transaction:
/// - Belongs to exactly one user
/// - Stores the amount as entered (currency for CREDIT, tokens for DEBIT)
/// - Starts as PROCESSING until it is settled against the balance
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Must be positive (enforced by CHECK constraint)
    pub amount: f64,

    #[sqlx(try_from = "String")]
    pub transaction_type: TransactionType,

    #[sqlx(try_from = "String")]
    pub transaction_status: Status,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub transaction_status: Status,
}

/// Request body for `POST /transactions`.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 300.0,
///   "transaction_type": "CREDIT"
/// }
/// ```
///
/// The owner is always the authenticated user.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: f64,
    pub transaction_type: TransactionType,
}

/// Query string of `GET /credit?amount=250`.
#[derive(Debug, Deserialize)]
pub struct CreditQuery {
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_upper_case() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Credit).unwrap(),
            "\"CREDIT\""
        );
        assert_eq!(serde_json::to_string(&Status::Failed).unwrap(), "\"FAILED\"");

        let parsed: TransactionType = serde_json::from_str("\"DEBIT\"").unwrap();
        assert_eq!(parsed, TransactionType::Debit);
    }

    #[test]
    fn unknown_stored_values_are_rejected() {
        assert!("REFUND".parse::<TransactionType>().is_err());
        assert!("done".parse::<Status>().is_err());
        assert_eq!("DONE".parse::<Status>().unwrap(), Status::Done);
    }

    #[test]
    fn only_processing_is_open() {
        assert!(!Status::Processing.is_terminal());
        assert!(Status::Done.is_terminal());
        assert!(Status::Failed.is_terminal());
    }
}
