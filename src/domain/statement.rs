use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StatementId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Money entering the account
    Deposit,
    /// Money leaving the account
    Withdraw,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(OperationType::Deposit),
            "withdraw" => Some(OperationType::Withdraw),
            _ => None,
        }
    }

    /// User-facing label, used in error messages and statement rendering only.
    pub fn description(&self) -> &'static str {
        match self {
            OperationType::Deposit => "Deposit",
            OperationType::Withdraw => "Withdraw",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// One immutable record of a single deposit or withdrawal and the balance it
/// produced. Statements are append-only - history is never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    /// When the operation was applied
    pub date: DateTime<Utc>,
    pub operation_type: OperationType,
    /// Requested magnitude (always positive, at most two decimal places)
    pub amount: Decimal,
    /// Account balance immediately after the operation
    pub balance: Decimal,
}

impl Statement {
    pub fn new(
        date: DateTime<Utc>,
        operation_type: OperationType,
        amount: Decimal,
        balance: Decimal,
    ) -> Self {
        assert!(amount > Decimal::ZERO, "Statement amount must be positive");
        Self {
            id: Uuid::new_v4(),
            date,
            operation_type,
            amount,
            balance,
        }
    }
}
