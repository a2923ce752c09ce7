// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use saldo::application::LedgerService;
use saldo::storage::SqliteAccountStore;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database. Also returns
/// the concrete store so tests can provision accounts and inspect state
/// outside the ledger contract.
pub async fn test_ledger() -> Result<(LedgerService, Arc<SqliteAccountStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let store = Arc::new(SqliteAccountStore::init(&db_url).await?);
    let service = LedgerService::new(store.clone());
    Ok((service, store, temp_dir))
}

/// Helper to parse a decimal amount literal
pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}
