use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use portfolio_history_core::models::cashflow::CashflowType;
use portfolio_history_core::models::transaction::TransactionType;

#[derive(Parser)]
#[command(name = "portfolio-history")]
#[command(version, about = "Daily net-worth history for a personal investment portfolio")]
#[command(
    long_about = "Reads transactions, deposits and dividends from the configured datastore, backfills one snapshot per business day (value, worth vs. deposits, AEX and S&P 500 closes) and prints chart data as JSON."
)]
pub struct Cli {
    /// Use a local JSON store instead of the remote datastore
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG), e.g. "debug"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append snapshots for every missing business day up to yesterday
    Backfill {
        /// Treat this date as "today" (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Net holdings per ticker as of a date
    Holdings {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Value the holdings of a past date with that day's closes and FX rates
    Value {
        #[arg(long)]
        date: NaiveDate,
    },

    /// Live portfolio table
    Portfolio {
        /// Only show these tickers
        #[arg(long = "ticker")]
        tickers: Vec<String>,
    },

    /// Live allocation by instrument type and ticker
    Allocation,

    /// Deposits and withdrawals with running total
    Cashflow,

    /// Dividends per ticker
    Dividends,

    /// Value, wv and benchmark series from the snapshot table
    Performance {
        /// Rebase every series to 100
        #[arg(long)]
        indexed: bool,
    },

    /// Record a buy or sell
    AddTransaction {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        ticker: String,
        #[arg(long = "type", value_enum)]
        kind: TransactionKind,
        /// Number of shares
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "EUR")]
        currency: String,
        #[arg(long, default_value_t = 1.0)]
        fx_rate: f64,
        #[arg(long, default_value_t = 0.0)]
        fee: f64,
        /// Defaults to amount × price
        #[arg(long)]
        total_value: Option<f64>,
    },

    /// Record a deposit, withdrawal or dividend
    AddCashflow {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long = "type", value_enum)]
        kind: CashflowKind,
        #[arg(long)]
        amount: f64,
        /// Paying ticker (dividends only)
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long, default_value = "EUR")]
        currency: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl From<TransactionKind> for TransactionType {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Buy => TransactionType::Buy,
            TransactionKind::Sell => TransactionType::Sell,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CashflowKind {
    Deposit,
    Withdrawal,
    DividendGross,
    DividendTax,
}

impl From<CashflowKind> for CashflowType {
    fn from(kind: CashflowKind) -> Self {
        match kind {
            CashflowKind::Deposit => CashflowType::Deposit,
            CashflowKind::Withdrawal => CashflowType::Withdrawal,
            CashflowKind::DividendGross => CashflowType::DividendGross,
            CashflowKind::DividendTax => CashflowType::DividendTax,
        }
    }
}
