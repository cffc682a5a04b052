//! Persistence layer.
//!
//! Handlers and services talk to a [`Store`]. Two implementations exist:
//! - [`postgres::PgStore`]: PostgreSQL through sqlx, used in production
//! - [`memory::MemoryStore`]: process-local maps, used when no database is
//!   configured and by the test suites
//!
//! Every multi-row write (registration, settlement) is atomic in both.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::exchange::ExchangeRate;
use crate::models::generation::{Generation, NewGeneration};
use crate::models::session::Session;
use crate::models::transaction::{NewTransaction, Status, Transaction};
use crate::models::user::{Balance, NewUser, User};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), AppError>;

    /// Insert the user, a balance of `initial_balance` and a DONE CREDIT
    /// transaction of the same amount.
    ///
    /// # Errors
    ///
    /// - `EmailTaken`: another user already has this email
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Remove a user with everything it owns. Returns false if nothing was deleted.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_balance(&self, user_id: Uuid) -> Result<Option<Balance>, AppError>;

    /// # Errors
    ///
    /// - `UserNotFound`: the owner does not exist
    async fn insert_transaction(&self, transaction: NewTransaction)
    -> Result<Transaction, AppError>;

    async fn find_transaction(&self, id: Uuid) -> Result<Option<Transaction>, AppError>;

    /// Transactions of one user, oldest first.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError>;

    /// Settle a PROCESSING transaction against the owner's balance.
    ///
    /// The transaction and the balance are locked together; the outcome is
    /// computed by [`crate::ledger::settle`]. Terminal transactions are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`: no such transaction
    /// - `BalanceNotFound`: the owner has no balance (the transaction is marked FAILED)
    /// - `ExchangeRateNotFound`: a CREDIT arrived before the rate was initialized
    async fn settle_transaction(&self, id: Uuid) -> Result<Transaction, AppError>;

    /// Create the exchange-rate record with `default_rate` unless one exists.
    async fn ensure_exchange_rate(&self, default_rate: f64) -> Result<ExchangeRate, AppError>;

    async fn find_exchange_rate(&self) -> Result<Option<ExchangeRate>, AppError>;

    /// Set a new rate and stamp `last_update`. None if the record is missing.
    async fn update_exchange_rate(&self, rate: f64) -> Result<Option<ExchangeRate>, AppError>;

    async fn insert_session(&self, session: Session) -> Result<(), AppError>;

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    /// Remove every session that expired at or before `now`. Returns how many were removed.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn insert_generation(&self, generation: NewGeneration) -> Result<Generation, AppError>;

    async fn find_generation(&self, id: Uuid) -> Result<Option<Generation>, AppError>;

    /// Generations of one user, newest first.
    async fn list_generations(&self, user_id: Uuid) -> Result<Vec<Generation>, AppError>;

    /// Move a generation to `status`, keeping the existing link when `s3_link` is None.
    /// Returns false if the generation does not exist.
    async fn update_generation(
        &self,
        id: Uuid,
        status: Status,
        s3_link: Option<String>,
    ) -> Result<bool, AppError>;
}
