mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{dec, test_ledger};
use saldo::application::LedgerError;
use saldo::storage::AccountStore;

/// N concurrent withdrawals of `a` against balance `B` succeed for at most
/// floor(B / a) of them; the rest fail with InsufficientBalance and the final
/// balance is exactly B - a * successes, never negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("100.00")).await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.withdraw("A1", dec("30.00")).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => successes += 1,
            Err(LedgerError::InsufficientBalance) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // floor(100 / 30) = 3 withdrawals fit.
    assert_eq!(successes, 3);
    assert_eq!(insufficient, 7);

    let balance = service.get_balance("A1").await?;
    assert_eq!(balance, dec("10.00"));
    assert!(balance >= dec("0"));

    let account = store.load("A1").await?.unwrap();
    assert_eq!(account.statements.len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_all_apply_exactly_once() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("0")).await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(
            async move { service.deposit("A1", dec("1.00")).await },
        ));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.get_balance("A1").await?, dec("20.00"));

    let account = store.load("A1").await?.unwrap();
    assert_eq!(account.statements.len(), 20);

    // Serialized appends keep the chain consistent and the dates monotonic.
    let report = service.check_account("A1").await?;
    assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
    Ok(())
}

/// Operations on different accounts are independent: mixing them
/// concurrently yields each account's own correct final state.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_accounts_do_not_interfere() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("50.00")).await?;
    store.create_account("A2", dec("50.00")).await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = service.clone();
        let account = if i % 2 == 0 { "A1" } else { "A2" };
        handles.push(tokio::spawn(async move {
            service.deposit(account, dec("10.00")).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.get_balance("A1").await?, dec("100.00"));
    assert_eq!(service.get_balance("A2").await?, dec("100.00"));
    Ok(())
}

/// Reads during concurrent writes always observe a consistent snapshot:
/// the balance matches the last statement's resulting balance.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_see_untorn_snapshots() -> Result<()> {
    let (service, store, _temp) = test_ledger().await?;
    store.create_account("A1", dec("0")).await?;
    let service = Arc::new(service);

    let writer = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..10 {
                service.deposit("A1", dec("1.00")).await.unwrap();
            }
        })
    };

    for _ in 0..20 {
        let account = store.load("A1").await?.unwrap();
        match account.statements.last() {
            Some(last) => assert_eq!(account.balance, last.balance),
            None => assert_eq!(account.balance, dec("0")),
        }
    }

    writer.await?;
    assert_eq!(service.get_balance("A1").await?, dec("10.00"));
    Ok(())
}
