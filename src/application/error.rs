use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account does not exist.")]
    AccountNotFound,

    #[error("{0}")]
    InvalidAmount(String),

    #[error("Insufficient balance.")]
    InsufficientBalance,

    /// Concurrent-update conflict that survived the bounded retry, or an
    /// expired lock wait. Retriable by the caller.
    #[error("Operation conflicted with a concurrent update, please retry.")]
    Conflict,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => LedgerError::Conflict,
            StoreError::Backend(e) => LedgerError::Storage(e),
        }
    }
}
