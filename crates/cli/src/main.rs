mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use portfolio_history_core::logging::{init_logging, LoggingConfig};
use portfolio_history_core::models::cashflow::CashflowRecord;
use portfolio_history_core::models::settings::Settings;
use portfolio_history_core::models::transaction::Transaction;
use portfolio_history_core::providers::registry::ProviderRegistry;
use portfolio_history_core::storage::json_file::JsonFileStore;
use portfolio_history_core::PortfolioTracker;
use serde::Serialize;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if let Some(level) = &cli.log_level {
        logging.log_level = level.clone();
    }
    logging.json = cli.json_logs;
    init_logging(&logging)?;

    let settings = Settings::from_env().context("invalid configuration")?;
    let mut tracker = match &cli.store {
        Some(path) => {
            info!(path = %path.display(), "using local JSON store");
            let store = Arc::new(JsonFileStore::new(path));
            PortfolioTracker::new(
                settings,
                store.clone(),
                store,
                ProviderRegistry::new_with_defaults(),
            )?
        }
        None => PortfolioTracker::from_settings(settings)
            .context("no datastore available; pass --store <path> to use a local file")?,
    };

    run(&mut tracker, cli.command).await
}

async fn run(tracker: &mut PortfolioTracker, command: Commands) -> Result<()> {
    match command {
        Commands::Backfill { as_of } => {
            let report = match as_of {
                Some(today) => tracker.backfill_history_as_of(today).await,
                None => tracker.backfill_history().await,
            }
            .context("backfill failed")?;
            if report.was_up_to_date() {
                info!("snapshot table already up to date");
            }
            print_json(&report)
        }
        Commands::Holdings { date } => {
            let date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            print_json(&tracker.holdings_on(date).await?)
        }
        Commands::Value { date } => print_json(&tracker.value_on(date).await?),
        Commands::Portfolio { tickers } => {
            let filter = (!tickers.is_empty()).then_some(tickers.as_slice());
            print_json(&tracker.portfolio_overview(filter).await?)
        }
        Commands::Allocation => print_json(&tracker.allocation().await?),
        Commands::Cashflow => print_json(&tracker.cash_flow().await?),
        Commands::Dividends => print_json(&tracker.dividend_breakdown().await?),
        Commands::Performance { indexed } => {
            let series = if indexed {
                tracker.indexed_performance().await?
            } else {
                tracker.performance().await?
            };
            print_json(&series)
        }
        Commands::AddTransaction {
            date,
            ticker,
            kind,
            amount,
            price,
            currency,
            fx_rate,
            fee,
            total_value,
        } => {
            let mut transaction = Transaction::new(date, ticker, kind.into(), amount, price, currency)
                .with_fx_rate(fx_rate)
                .with_fee(fee);
            if let Some(total) = total_value {
                transaction.total_value = total;
            }
            let stored = tracker
                .add_transaction(transaction)
                .await
                .context("could not record transaction")?;
            print_json(&stored)
        }
        Commands::AddCashflow {
            date,
            kind,
            amount,
            ticker,
            currency,
        } => {
            let record = CashflowRecord::new(date, ticker, amount, kind.into(), currency);
            let stored = tracker
                .add_cashflow(record)
                .await
                .context("could not record cashflow")?;
            print_json(&stored)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
