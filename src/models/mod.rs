//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Singleton exchange rate
pub mod exchange;
/// Speech generation history and worker tasks
pub mod generation;
/// Bearer token sessions
pub mod session;
/// Transactions and their status enums
pub mod transaction;
/// Users and balances
pub mod user;
