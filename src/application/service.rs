use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use crate::domain::{audit_account, Account, IntegrityReport, OperationType, Statement};
use crate::storage::{AccountStore, SqliteAccountStore, StoreError};

use super::LedgerError;

pub const POSITIVE_AMOUNT_MESSAGE: &str = " amount must be positive.";
pub const PRECISION_EXCEEDED_MESSAGE: &str = "Amount must not have more than two decimal places.";
pub const NO_STATEMENT: &str = "Account has no statement.";

pub const STATEMENT_HEADER: &str = "Date                | Type       | Amount  | Balance\n";
pub const STATEMENT_DELIMITER: &str =
    "-----------------------------------------------------\n";

/// How long a writer may wait for an account's lock before the operation is
/// surfaced as retriable instead of blocking indefinitely.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Save attempts before an optimistic-store conflict is surfaced.
const MAX_SAVE_ATTEMPTS: u32 = 3;

/// Application service providing the ledger operations: deposit, withdraw,
/// balance query and statement rendering. This is the sole mutation path for
/// accounts; durability is delegated to the injected [`AccountStore`].
///
/// Writers serialize per account id - never globally - so concurrent
/// operations against one account behave as if executed one at a time while
/// unrelated accounts proceed in parallel.
pub struct LedgerService {
    store: Arc<dyn AccountStore>,
    locks: LockRegistry,
}

impl LedgerService {
    /// Create a new ledger service with the given account store.
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self {
            store,
            locks: LockRegistry::default(),
        }
    }

    /// Initialize a new SQLite-backed service at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = SqliteAccountStore::init(&db_url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Connect to an existing SQLite-backed service.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = SqliteAccountStore::connect(&db_url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    // ========================
    // Mutating operations
    // ========================

    /// Deposit `amount` into the account.
    pub async fn deposit(&self, account_id: &str, amount: Decimal) -> Result<(), LedgerError> {
        validate_positive(amount, OperationType::Deposit)?;
        validate_precision(amount)?;
        self.mutate(account_id, OperationType::Deposit, amount).await
    }

    /// Withdraw `amount` from the account.
    ///
    /// Positivity and precision are checked before balance sufficiency, so a
    /// negative or over-precise request reports `InvalidAmount` even when the
    /// balance would also be insufficient.
    pub async fn withdraw(&self, account_id: &str, amount: Decimal) -> Result<(), LedgerError> {
        validate_positive(amount, OperationType::Withdraw)?;
        validate_precision(amount)?;
        self.mutate(account_id, OperationType::Withdraw, amount).await
    }

    /// The read-modify-write critical section. Holds the account's lock
    /// across {load, validate, mutate, save} so no other operation observes
    /// or applies against the same account in between.
    async fn mutate(
        &self,
        account_id: &str,
        operation_type: OperationType,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let lock = self.locks.lock_for(account_id);
        let _guard = timeout(LOCK_TIMEOUT, lock.lock())
            .await
            .map_err(|_| LedgerError::Conflict)?;

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let mut account = self
                .store
                .load(account_id)
                .await?
                .ok_or(LedgerError::AccountNotFound)?;

            let new_balance = match operation_type {
                OperationType::Deposit => account.balance + amount,
                OperationType::Withdraw => {
                    if amount > account.balance {
                        return Err(LedgerError::InsufficientBalance);
                    }
                    account.balance - amount
                }
            };

            account.balance = new_balance;
            account.statements.push(Statement::new(
                Utc::now(),
                operation_type,
                amount,
                new_balance,
            ));

            match self.store.save(&account).await {
                Ok(()) => {
                    tracing::info!(
                        account_id,
                        operation = operation_type.as_str(),
                        %amount,
                        balance = %new_balance,
                        "operation applied"
                    );
                    return Ok(());
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(account_id, attempt, "stale account snapshot on save, retrying");
                    continue;
                }
                Err(StoreError::Backend(e)) => return Err(LedgerError::Storage(e)),
            }
        }

        Err(LedgerError::Conflict)
    }

    // ========================
    // Read operations
    // ========================

    /// Current balance. Pure read - no statement is appended.
    pub async fn get_balance(&self, account_id: &str) -> Result<Decimal, LedgerError> {
        let account = self.load(account_id).await?;
        Ok(account.balance)
    }

    /// Render the account's history as a fixed-width table, most recent
    /// operation first. An account with no history gets a fixed sentinel
    /// line rather than an error.
    pub async fn get_statement(&self, account_id: &str) -> Result<String, LedgerError> {
        let account = self.load(account_id).await?;
        Ok(render_statement(&account.statements))
    }

    /// Audit the account's statement chain against the ledger invariants.
    pub async fn check_account(&self, account_id: &str) -> Result<IntegrityReport, LedgerError> {
        let account = self.load(account_id).await?;
        Ok(audit_account(&account))
    }

    async fn load(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.store
            .load(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound)
    }
}

fn validate_positive(amount: Decimal, operation_type: OperationType) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "{}{}",
            operation_type.description(),
            POSITIVE_AMOUNT_MESSAGE
        )));
    }
    Ok(())
}

fn validate_precision(amount: Decimal) -> Result<(), LedgerError> {
    if amount.scale() > 2 {
        return Err(LedgerError::InvalidAmount(
            PRECISION_EXCEEDED_MESSAGE.to_string(),
        ));
    }
    Ok(())
}

/// Render statements most-recent-first. Equal dates fall back to insertion
/// order with the newest append first, so the projection stays deterministic;
/// the stored history itself remains chronological.
pub fn render_statement(statements: &[Statement]) -> String {
    if statements.is_empty() {
        return NO_STATEMENT.to_string();
    }

    let mut ordered: Vec<(usize, &Statement)> = statements.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));

    let mut out = String::with_capacity(
        STATEMENT_HEADER.len() + STATEMENT_DELIMITER.len() + ordered.len() * 56,
    );
    out.push_str(STATEMENT_HEADER);
    out.push_str(STATEMENT_DELIMITER);
    for (_, statement) in ordered {
        let date = statement.date.format("%Y-%m-%d %H:%M:%S").to_string();
        out.push_str(&format!(
            "{:<20}| {:<10}| {:<8}| {:<8}\n",
            date,
            statement.operation_type.description(),
            format!("{:.2}", statement.amount),
            format!("{:.2}", statement.balance),
        ));
    }
    out
}

/// One async mutex per account id, handed out on demand. Unrelated accounts
/// never contend on the same lock; the registry map itself is only held long
/// enough to clone the entry.
#[derive(Default)]
struct LockRegistry {
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    fn lock_for(&self, account_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
