use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Statement;

pub type AccountId = String;

/// An account holds its current balance and the ordered history of operations
/// applied to it. Statement order is insertion order, which equals the
/// chronological order of applied operations.
///
/// All mutation goes through the ledger service; the account itself is plain
/// data plus invariant checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Current balance, never negative, scale at most 2
    pub balance: Decimal,
    /// Append-only operation history, oldest first
    pub statements: Vec<Statement>,
    /// Optimistic-concurrency token, managed by the account store
    pub version: i64,
}

impl Account {
    pub fn new(id: impl Into<String>, balance: Decimal) -> Self {
        assert!(
            balance >= Decimal::ZERO,
            "Account balance must not be negative"
        );
        Self {
            id: id.into(),
            balance,
            statements: Vec::new(),
            version: 0,
        }
    }

    /// Balance recorded by the most recent statement, if any.
    pub fn last_statement_balance(&self) -> Option<Decimal> {
        self.statements.last().map(|s| s.balance)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::OperationType;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_account_has_no_statements() {
        let account = Account::new("A1", dec("100.00"));
        assert_eq!(account.id, "A1");
        assert_eq!(account.balance, dec("100.00"));
        assert!(account.statements.is_empty());
        assert_eq!(account.version, 0);
    }

    #[test]
    fn test_last_statement_balance() {
        let mut account = Account::new("A1", dec("100.00"));
        assert_eq!(account.last_statement_balance(), None);

        account.statements.push(Statement::new(
            Utc::now(),
            OperationType::Deposit,
            dec("50.00"),
            dec("150.00"),
        ));
        assert_eq!(account.last_statement_balance(), Some(dec("150.00")));
    }

    #[test]
    #[should_panic(expected = "Account balance must not be negative")]
    fn test_account_rejects_negative_opening_balance() {
        Account::new("A1", dec("-1.00"));
    }
}
