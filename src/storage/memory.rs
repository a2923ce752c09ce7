use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::domain::{Account, AccountId};

use super::{AccountStore, StoreError};

/// In-memory account store for tests and experimentation.
///
/// Applies the same version discipline as the SQLite store so conflict
/// handling can be exercised without a database file.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a new account with an opening balance.
    pub async fn create_account(&self, account_id: &str, opening_balance: Decimal) -> Account {
        let account = Account::new(account_id, opening_balance);
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        account
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(account_id).cloned())
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get(&account.id)
            .ok_or_else(|| anyhow!("cannot save unknown account: {}", account.id))?;

        if stored.version != account.version {
            return Err(StoreError::Conflict);
        }

        let mut next = account.clone();
        next.version += 1;
        accounts.insert(next.id.clone(), next);
        Ok(())
    }
}
