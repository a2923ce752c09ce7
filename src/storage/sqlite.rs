use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Account, OperationType, Statement};

use super::{AccountStore, StoreError, MIGRATION_001_INITIAL};

/// SQLite-backed account store.
///
/// Saves are guarded by the account row's `version` column: a save based on a
/// stale snapshot updates zero rows and reports `StoreError::Conflict` without
/// touching anything.
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Provision a new account with an opening balance.
    ///
    /// Account provisioning sits outside the ledger contract: the service
    /// only ever loads and saves existing accounts.
    pub async fn create_account(&self, account_id: &str, opening_balance: Decimal) -> Result<Account> {
        let account = Account::new(account_id, opening_balance);
        sqlx::query("INSERT INTO accounts (account_id, balance, version) VALUES (?, ?, ?)")
            .bind(&account.id)
            .bind(account.balance.to_string())
            .bind(account.version)
            .execute(&self.pool)
            .await
            .context("Failed to create account")?;
        Ok(account)
    }

    fn row_to_statement(row: &sqlx::sqlite::SqliteRow) -> Result<Statement> {
        let id_str: String = row.get("statement_id");
        let date_str: String = row.get("date");
        let operation_type_str: String = row.get("operation_type");
        let amount_str: String = row.get("amount");
        let balance_str: String = row.get("balance");

        Ok(Statement {
            id: Uuid::parse_str(&id_str).context("Invalid statement ID")?,
            date: DateTime::parse_from_rfc3339(&date_str)
                .context("Invalid statement date")?
                .with_timezone(&Utc),
            operation_type: OperationType::from_str(&operation_type_str).ok_or_else(|| {
                anyhow::anyhow!("Invalid operation type: {}", operation_type_str)
            })?,
            amount: amount_str
                .parse::<Decimal>()
                .context("Invalid statement amount")?,
            balance: balance_str
                .parse::<Decimal>()
                .context("Invalid statement balance")?,
        })
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, StoreError> {
        // One transaction so balance and statements come from the same
        // snapshot - a reader never sees a balance without its statement.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT account_id, balance, version FROM accounts WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch account")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let balance_str: String = row.get("balance");
        let balance = balance_str
            .parse::<Decimal>()
            .context("Invalid account balance")?;
        let version: i64 = row.get("version");

        let statement_rows = sqlx::query(
            r#"
            SELECT statement_id, date, operation_type, amount, balance
            FROM statements
            WHERE account_id = ?
            ORDER BY position
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to fetch statements")?;

        tx.commit().await.context("Failed to commit read")?;

        let statements = statement_rows
            .iter()
            .map(Self::row_to_statement)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Account {
            id: row.get("account_id"),
            balance,
            statements,
            version,
        }))
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let result = sqlx::query(
            "UPDATE accounts SET balance = ?, version = ? WHERE account_id = ? AND version = ?",
        )
        .bind(account.balance.to_string())
        .bind(account.version + 1)
        .bind(&account.id)
        .bind(account.version)
        .execute(&mut *tx)
        .await
        .context("Failed to update account")?;

        if result.rows_affected() == 0 {
            // Stale snapshot (or unknown account); dropping tx rolls back.
            return Err(StoreError::Conflict);
        }

        let count_row = sqlx::query("SELECT COUNT(*) as count FROM statements WHERE account_id = ?")
            .bind(&account.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count statements")?;
        let persisted: i64 = count_row.get("count");

        for (position, statement) in account.statements.iter().enumerate().skip(persisted as usize)
        {
            sqlx::query(
                r#"
                INSERT INTO statements (statement_id, account_id, position, date, operation_type, amount, balance)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(statement.id.to_string())
            .bind(&account.id)
            .bind(position as i64)
            .bind(statement.date.to_rfc3339())
            .bind(statement.operation_type.as_str())
            .bind(statement.amount.to_string())
            .bind(statement.balance.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to append statement")?;
        }

        tx.commit().await.context("Failed to commit save")?;
        Ok(())
    }
}
