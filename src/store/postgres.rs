//! PostgreSQL store.
//!
//! # Atomicity Guarantees
//!
//! Registration and settlement run inside PostgreSQL transactions. Settlement
//! locks the transaction row and then the balance row with `FOR UPDATE`, so
//! two concurrent settlements of the same user are serialized by the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::ledger;
use crate::models::exchange::ExchangeRate;
use crate::models::generation::{Generation, NewGeneration};
use crate::models::session::Session;
use crate::models::transaction::{NewTransaction, Status, Transaction, TransactionType};
use crate::models::user::{Balance, NewUser, User};
use crate::store::Store;

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if has_code(&e, UNIQUE_VIOLATION) {
                AppError::EmailTaken
            } else {
                AppError::Database(e)
            }
        })?;

        sqlx::query("INSERT INTO balances (user_id, amount) VALUES ($1, $2)")
            .bind(record.id)
            .bind(user.initial_balance)
            .execute(&mut *tx)
            .await?;

        // Opening deposit, already settled
        sqlx::query(
            r#"
            INSERT INTO transactions (user_id, amount, transaction_type, transaction_status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id)
        .bind(user.initial_balance)
        .bind(TransactionType::Credit.as_str())
        .bind(Status::Done.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        // Balances, transactions, generations and sessions cascade
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn find_balance(&self, user_id: Uuid) -> Result<Option<Balance>, AppError> {
        let balance = sqlx::query_as::<_, Balance>(
            "SELECT id, user_id, amount FROM balances WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, amount, transaction_type, transaction_status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, amount, transaction_type, transaction_status, created_at
            "#,
        )
        .bind(transaction.user_id)
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.transaction_status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if has_code(&e, FOREIGN_KEY_VIOLATION) {
                AppError::UserNotFound
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<Transaction>, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, transaction_type, transaction_status, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, transaction_type, transaction_status, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn settle_transaction(&self, id: Uuid) -> Result<Transaction, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the transaction first so a concurrent settlement waits here
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, amount, transaction_type, transaction_status, created_at
            FROM transactions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

        if transaction.transaction_status.is_terminal() {
            tx.rollback().await?;
            return Ok(transaction);
        }

        let balance: Option<f64> =
            sqlx::query_scalar("SELECT amount FROM balances WHERE user_id = $1 FOR UPDATE")
                .bind(transaction.user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(balance) = balance else {
            sqlx::query("UPDATE transactions SET transaction_status = $1 WHERE id = $2")
                .bind(Status::Failed.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(AppError::BalanceNotFound);
        };

        let rate = match transaction.transaction_type {
            TransactionType::Credit => {
                let rate: Option<f64> =
                    sqlx::query_scalar("SELECT rate FROM exchange_service LIMIT 1")
                        .fetch_optional(&mut *tx)
                        .await?;
                match rate {
                    Some(rate) => rate,
                    None => {
                        tx.rollback().await?;
                        return Err(AppError::ExchangeRateNotFound);
                    }
                }
            }
            TransactionType::Debit => 1.0,
        };

        let outcome = ledger::settle(
            transaction.transaction_type,
            transaction.amount,
            balance,
            rate,
        );

        if outcome.status == Status::Done {
            sqlx::query("UPDATE balances SET amount = $1 WHERE user_id = $2")
                .bind(outcome.balance)
                .bind(transaction.user_id)
                .execute(&mut *tx)
                .await?;
        }

        let settled = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET transaction_status = $1
            WHERE id = $2
            RETURNING id, user_id, amount, transaction_type, transaction_status, created_at
            "#,
        )
        .bind(outcome.status.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(settled)
    }

    async fn ensure_exchange_rate(&self, default_rate: f64) -> Result<ExchangeRate, AppError> {
        // The singleton column is UNIQUE, so a concurrent insert becomes a no-op
        sqlx::query(
            "INSERT INTO exchange_service (rate) VALUES ($1) ON CONFLICT (singleton) DO NOTHING",
        )
        .bind(default_rate)
        .execute(&self.pool)
        .await?;

        self.find_exchange_rate()
            .await?
            .ok_or(AppError::ExchangeRateNotFound)
    }

    async fn find_exchange_rate(&self) -> Result<Option<ExchangeRate>, AppError> {
        let rate = sqlx::query_as::<_, ExchangeRate>(
            "SELECT id, rate, last_update FROM exchange_service LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    async fn update_exchange_rate(&self, rate: f64) -> Result<Option<ExchangeRate>, AppError> {
        let updated = sqlx::query_as::<_, ExchangeRate>(
            r#"
            UPDATE exchange_service
            SET rate = $1, last_update = NOW()
            RETURNING id, rate, last_update
            "#,
        )
        .bind(rate)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn insert_session(&self, session: Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if has_code(&e, FOREIGN_KEY_VIOLATION) {
                AppError::UserNotFound
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn insert_generation(&self, generation: NewGeneration) -> Result<Generation, AppError> {
        sqlx::query_as::<_, Generation>(
            r#"
            INSERT INTO generation_history (id, user_id, text, tokens_spent, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, text, tokens_spent, status, s3_link, created_at
            "#,
        )
        .bind(generation.id)
        .bind(generation.user_id)
        .bind(&generation.text)
        .bind(generation.tokens_spent)
        .bind(Status::Processing.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if has_code(&e, FOREIGN_KEY_VIOLATION) {
                AppError::UserNotFound
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn find_generation(&self, id: Uuid) -> Result<Option<Generation>, AppError> {
        let generation = sqlx::query_as::<_, Generation>(
            r#"
            SELECT id, user_id, text, tokens_spent, status, s3_link, created_at
            FROM generation_history
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(generation)
    }

    async fn list_generations(&self, user_id: Uuid) -> Result<Vec<Generation>, AppError> {
        let generations = sqlx::query_as::<_, Generation>(
            r#"
            SELECT id, user_id, text, tokens_spent, status, s3_link, created_at
            FROM generation_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(generations)
    }

    async fn update_generation(
        &self,
        id: Uuid,
        status: Status,
        s3_link: Option<String>,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE generation_history
            SET status = $1, s3_link = COALESCE($2, s3_link)
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(s3_link)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}
