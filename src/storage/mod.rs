mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Account;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

#[derive(Error, Debug)]
pub enum StoreError {
    /// The account changed since it was loaded; retry from a fresh snapshot.
    #[error("concurrent update detected")]
    Conflict,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Durable-storage contract the ledger service depends on.
///
/// `load` returns one consistent snapshot of balance plus full statement
/// history; `save` persists the new state atomically - either everything is
/// applied or the prior state is unaffected.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self, account_id: &str) -> Result<Option<Account>, StoreError>;

    async fn save(&self, account: &Account) -> Result<(), StoreError>;
}
