mod common;

use anyhow::Result;
use common::{dec, test_ledger};
use saldo::application::{NO_STATEMENT, STATEMENT_DELIMITER, STATEMENT_HEADER};
use saldo::domain::OperationType;
use saldo::storage::AccountStore;

#[tokio::test]
async fn test_empty_history_returns_sentinel() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("100.00")).await?;

    let statement = service.get_statement("A1").await?;
    assert_eq!(statement, NO_STATEMENT);
    Ok(())
}

#[tokio::test]
async fn test_statement_renders_most_recent_first() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("0")).await?;

    service.deposit("A1", dec("100.00")).await?;
    service.withdraw("A1", dec("30.00")).await?;

    let statement = service.get_statement("A1").await?;
    let lines: Vec<&str> = statement.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], STATEMENT_HEADER.trim_end_matches('\n'));
    assert_eq!(lines[1], STATEMENT_DELIMITER.trim_end_matches('\n'));

    // The withdrawal happened last, so it renders first.
    assert!(lines[2].contains("Withdraw"), "got: {}", lines[2]);
    assert!(lines[2].ends_with("| Withdraw  | 30.00   | 70.00   "));
    assert!(lines[3].contains("Deposit"), "got: {}", lines[3]);
    assert!(lines[3].ends_with("| Deposit   | 100.00  | 100.00  "));
    Ok(())
}

#[tokio::test]
async fn test_amounts_render_with_two_decimal_places() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("0")).await?;

    service.deposit("A1", dec("5")).await?;
    service.deposit("A1", dec("0.5")).await?;

    let statement = service.get_statement("A1").await?;
    assert!(statement.contains("| 0.50    | 5.50    "));
    assert!(statement.contains("| 5.00    | 5.00    "));
    Ok(())
}

#[tokio::test]
async fn test_rendering_does_not_mutate_stored_history() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("0")).await?;

    service.deposit("A1", dec("100.00")).await?;
    service.withdraw("A1", dec("30.00")).await?;

    let first = service.get_statement("A1").await?;
    let second = service.get_statement("A1").await?;
    assert_eq!(first, second);

    // The stored order stays chronological even though the projection is
    // reversed.
    let account = store.load("A1").await?.unwrap();
    assert_eq!(account.statements[0].operation_type, OperationType::Deposit);
    assert_eq!(account.statements[1].operation_type, OperationType::Withdraw);
    Ok(())
}
