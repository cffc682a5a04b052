//! In-memory store.
//!
//! All state sits behind one mutex, so each trait method observes and
//! mutates a consistent snapshot. Nothing here awaits while the lock is held.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::ledger;
use crate::models::exchange::ExchangeRate;
use crate::models::generation::{Generation, NewGeneration};
use crate::models::session::Session;
use crate::models::transaction::{NewTransaction, Status, Transaction, TransactionType};
use crate::models::user::{Balance, NewUser, User};
use crate::store::Store;

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    balances: HashMap<Uuid, Balance>,
    // insertion order doubles as timestamp order
    transactions: Vec<Transaction>,
    exchange_rate: Option<ExchangeRate>,
    sessions: HashMap<String, Session>,
    generations: Vec<Generation>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user's balance row while keeping the user.
    ///
    /// Only exists so tests can reach the "balance missing" settlement path.
    pub fn remove_balance(&self, user_id: Uuid) -> bool {
        self.state.lock().balances.remove(&user_id).is_some()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.lock();

        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailTaken);
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
        };

        state.balances.insert(
            record.id,
            Balance {
                id: Uuid::new_v4(),
                user_id: record.id,
                amount: user.initial_balance,
            },
        );
        state.transactions.push(Transaction {
            id: Uuid::new_v4(),
            user_id: record.id,
            amount: user.initial_balance,
            transaction_type: TransactionType::Credit,
            transaction_status: Status::Done,
            created_at: now,
        });
        state.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.state.lock().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock();

        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        state.balances.remove(&id);
        state.transactions.retain(|t| t.user_id != id);
        state.generations.retain(|g| g.user_id != id);
        state.sessions.retain(|_, s| s.user_id != id);

        Ok(true)
    }

    async fn find_balance(&self, user_id: Uuid) -> Result<Option<Balance>, AppError> {
        Ok(self.state.lock().balances.get(&user_id).cloned())
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, AppError> {
        let mut state = self.state.lock();

        if !state.users.contains_key(&transaction.user_id) {
            return Err(AppError::UserNotFound);
        }

        let record = Transaction {
            id: Uuid::new_v4(),
            user_id: transaction.user_id,
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            transaction_status: transaction.transaction_status,
            created_at: Utc::now(),
        };
        state.transactions.push(record.clone());

        Ok(record)
    }

    async fn find_transaction(&self, id: Uuid) -> Result<Option<Transaction>, AppError> {
        Ok(self
            .state
            .lock()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        Ok(self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn settle_transaction(&self, id: Uuid) -> Result<Transaction, AppError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let position = state
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        let transaction = state.transactions[position].clone();
        if transaction.transaction_status.is_terminal() {
            return Ok(transaction);
        }

        let Some(balance) = state.balances.get_mut(&transaction.user_id) else {
            state.transactions[position].transaction_status = Status::Failed;
            return Err(AppError::BalanceNotFound);
        };

        let rate = match transaction.transaction_type {
            TransactionType::Credit => {
                state
                    .exchange_rate
                    .as_ref()
                    .ok_or(AppError::ExchangeRateNotFound)?
                    .rate
            }
            // debits are denominated in tokens already
            TransactionType::Debit => 1.0,
        };

        let outcome = ledger::settle(
            transaction.transaction_type,
            transaction.amount,
            balance.amount,
            rate,
        );
        balance.amount = outcome.balance;
        state.transactions[position].transaction_status = outcome.status;

        Ok(state.transactions[position].clone())
    }

    async fn ensure_exchange_rate(&self, default_rate: f64) -> Result<ExchangeRate, AppError> {
        let mut state = self.state.lock();
        let record = state.exchange_rate.get_or_insert_with(|| ExchangeRate {
            id: Uuid::new_v4(),
            rate: default_rate,
            last_update: Utc::now(),
        });
        Ok(record.clone())
    }

    async fn find_exchange_rate(&self) -> Result<Option<ExchangeRate>, AppError> {
        Ok(self.state.lock().exchange_rate.clone())
    }

    async fn update_exchange_rate(&self, rate: f64) -> Result<Option<ExchangeRate>, AppError> {
        let mut state = self.state.lock();
        Ok(state.exchange_rate.as_mut().map(|record| {
            record.rate = rate;
            record.last_update = Utc::now();
            record.clone()
        }))
    }

    async fn insert_session(&self, session: Session) -> Result<(), AppError> {
        let mut state = self.state.lock();
        if !state.users.contains_key(&session.user_id) {
            return Err(AppError::UserNotFound);
        }
        state.sessions.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, AppError> {
        Ok(self.state.lock().sessions.get(token_hash).cloned())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.state.lock();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - state.sessions.len()) as u64)
    }

    async fn insert_generation(&self, generation: NewGeneration) -> Result<Generation, AppError> {
        let mut state = self.state.lock();

        if !state.users.contains_key(&generation.user_id) {
            return Err(AppError::UserNotFound);
        }

        let record = Generation {
            id: generation.id,
            user_id: generation.user_id,
            text: generation.text,
            tokens_spent: generation.tokens_spent,
            status: Status::Processing,
            s3_link: None,
            created_at: Utc::now(),
        };
        state.generations.push(record.clone());

        Ok(record)
    }

    async fn find_generation(&self, id: Uuid) -> Result<Option<Generation>, AppError> {
        Ok(self
            .state
            .lock()
            .generations
            .iter()
            .find(|g| g.id == id)
            .cloned())
    }

    async fn list_generations(&self, user_id: Uuid) -> Result<Vec<Generation>, AppError> {
        Ok(self
            .state
            .lock()
            .generations
            .iter()
            .rev()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_generation(
        &self,
        id: Uuid,
        status: Status,
        s3_link: Option<String>,
    ) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        match state.generations.iter_mut().find(|g| g.id == id) {
            Some(generation) => {
                generation.status = status;
                if s3_link.is_some() {
                    generation.s3_link = s3_link;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
