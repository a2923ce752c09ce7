use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::application::LedgerService;
use crate::storage::SqliteAccountStore;

/// Saldo - Bank Account Ledger
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A bank account ledger service with strict balance guarantees")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Provision a new account with an opening balance
    CreateAccount {
        /// Account identifier
        id: String,

        /// Opening balance (e.g., "100.00", defaults to zero)
        #[arg(short, long, default_value = "0")]
        balance: String,
    },

    /// Audit an account's statement history against the ledger invariants
    Check {
        /// Account identifier
        id: String,
    },

    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::CreateAccount { id, balance } => {
                if id.trim().is_empty() {
                    anyhow::bail!("Account id must not be empty");
                }
                let opening_balance: Decimal = balance
                    .parse()
                    .context("Invalid balance format. Use '100.00' or '100'")?;
                if opening_balance < Decimal::ZERO {
                    anyhow::bail!("Opening balance must not be negative");
                }
                if opening_balance.scale() > 2 {
                    anyhow::bail!("Opening balance must not have more than two decimal places");
                }

                let store =
                    SqliteAccountStore::connect(&format!("sqlite:{}", self.database)).await?;
                let account = store.create_account(&id, opening_balance).await?;
                println!("Created account: {} (balance {:.2})", account.id, account.balance);
            }

            Commands::Check { id } => {
                let store =
                    SqliteAccountStore::connect(&format!("sqlite:{}", self.database)).await?;
                let service = LedgerService::new(Arc::new(store));
                let report = service.check_account(&id).await?;

                println!(
                    "Account {}: {} statements",
                    report.account_id, report.statement_count
                );
                if report.is_clean() {
                    println!("No issues found.");
                } else {
                    println!("Issues:");
                    for issue in &report.issues {
                        println!("  - {}", issue);
                    }
                    anyhow::bail!("Integrity check failed");
                }
            }

            Commands::Serve { listen } => {
                let service = LedgerService::connect(&self.database).await?;
                crate::http::serve(Arc::new(service), &listen).await?;
            }
        }

        Ok(())
    }
}
