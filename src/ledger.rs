//! Settlement rules for transactions against a balance.
//!
//! Both stores lock the balance and then call [`settle`], so the arithmetic
//! lives in one place and can be tested without a database.

use crate::models::transaction::{Status, TransactionType};

/// Result of applying one PROCESSING transaction to a balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Terminal status the transaction moves to
    pub status: Status,

    /// Balance after the transaction (unchanged when it failed)
    pub balance: f64,
}

/// Apply a transaction to a balance.
///
/// - CREDIT adds `amount * rate` tokens, or fails when the new balance would
///   not be a finite number
/// - DEBIT removes `amount` tokens, or fails without touching the balance
///   when the balance is smaller than the amount
pub fn settle(kind: TransactionType, amount: f64, balance: f64, rate: f64) -> Settlement {
    match kind {
        TransactionType::Credit => {
            let credited = balance + amount * rate;
            if credited.is_finite() {
                Settlement {
                    status: Status::Done,
                    balance: credited,
                }
            } else {
                Settlement {
                    status: Status::Failed,
                    balance,
                }
            }
        }
        TransactionType::Debit if balance < amount => Settlement {
            status: Status::Failed,
            balance,
        },
        TransactionType::Debit => Settlement {
            status: Status::Done,
            balance: balance - amount,
        },
    }
}

/// Amounts must be finite and strictly positive.
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_converts_at_rate() {
        let outcome = settle(TransactionType::Credit, 300.0, 100.0, 1.2);
        assert_eq!(outcome.status, Status::Done);
        assert_eq!(outcome.balance, 100.0 + 300.0 * 1.2);
    }

    #[test]
    fn debit_subtracts_tokens_without_conversion() {
        let outcome = settle(TransactionType::Debit, 40.0, 100.0, 1.2);
        assert_eq!(outcome.status, Status::Done);
        assert_eq!(outcome.balance, 60.0);
    }

    #[test]
    fn debit_of_entire_balance_succeeds() {
        let outcome = settle(TransactionType::Debit, 100.0, 100.0, 1.2);
        assert_eq!(outcome.status, Status::Done);
        assert_eq!(outcome.balance, 0.0);
    }

    #[test]
    fn overdraft_fails_and_keeps_balance() {
        let outcome = settle(TransactionType::Debit, 100.5, 100.0, 1.2);
        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(outcome.balance, 100.0);
    }

    #[test]
    fn credit_overflowing_the_balance_fails() {
        let outcome = settle(TransactionType::Credit, 1.7e308, 100.0, 1.2);
        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(outcome.balance, 100.0);

        let outcome = settle(TransactionType::Credit, 1.0e308, 1.0e308, 1.0);
        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(outcome.balance, 1.0e308);
    }

    #[test]
    fn amount_validation() {
        assert!(is_valid_amount(0.01));
        assert!(!is_valid_amount(0.0));
        assert!(!is_valid_amount(-100.0));
        assert!(!is_valid_amount(f64::NAN));
        assert!(!is_valid_amount(f64::INFINITY));
    }
}
