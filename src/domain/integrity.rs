use rust_decimal::Decimal;

use super::{Account, OperationType};

/// Result of auditing one account's statement history.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub account_id: super::AccountId,
    pub statement_count: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Replay an account's statement chain and report every invariant violation:
/// non-positive or over-precise amounts, negative balances, broken chain
/// links, out-of-order dates, and a stored balance that disagrees with the
/// last statement.
pub fn audit_account(account: &Account) -> IntegrityReport {
    let mut issues = Vec::new();

    if account.balance < Decimal::ZERO {
        issues.push(format!("stored balance {} is negative", account.balance));
    }

    let mut previous_balance: Option<Decimal> = None;
    let mut previous_date = None;

    for (position, statement) in account.statements.iter().enumerate() {
        if statement.amount <= Decimal::ZERO {
            issues.push(format!(
                "statement {position} has non-positive amount {}",
                statement.amount
            ));
        }
        if statement.amount.scale() > 2 {
            issues.push(format!(
                "statement {position} amount {} exceeds two decimal places",
                statement.amount
            ));
        }
        if statement.balance < Decimal::ZERO {
            issues.push(format!(
                "statement {position} records negative balance {}",
                statement.balance
            ));
        }

        // The chain link: each resulting balance must be the previous one
        // plus/minus this statement's amount. The first statement is anchored
        // on whatever balance the account was provisioned with, so only
        // subsequent links can be checked.
        if let Some(prev) = previous_balance {
            let expected = match statement.operation_type {
                OperationType::Deposit => prev + statement.amount,
                OperationType::Withdraw => prev - statement.amount,
            };
            if statement.balance != expected {
                issues.push(format!(
                    "statement {position} records balance {} but the chain expects {expected}",
                    statement.balance
                ));
            }
        }
        previous_balance = Some(statement.balance);

        if let Some(prev_date) = previous_date {
            if statement.date < prev_date {
                issues.push(format!("statement {position} is dated before its predecessor"));
            }
        }
        previous_date = Some(statement.date);
    }

    if let Some(last) = account.last_statement_balance() {
        if last != account.balance {
            issues.push(format!(
                "stored balance {} disagrees with last statement balance {last}",
                account.balance
            ));
        }
    }

    IntegrityReport {
        account_id: account.id.clone(),
        statement_count: account.statements.len(),
        issues,
    }
}
