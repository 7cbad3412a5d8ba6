use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::transaction::{Transaction, TransactionType};

/// Net quantities below this are treated as a closed position.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Currency assumed for a ticker with no transaction yet.
pub const FALLBACK_CURRENCY: &str = "EUR";

/// A ticker held on a given date, with the currency it is valued in.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldPosition {
    pub ticker: String,
    pub quantity: f64,
    pub currency: String,
}

/// Reconstructs holdings from the transaction ledger.
///
/// Pure business logic, no I/O. Results never look past the target date.
pub struct HoldingsService;

impl HoldingsService {
    pub fn new() -> Self {
        Self
    }

    /// Net quantity per ticker as of `date` (inclusive).
    ///
    /// Buys and sells are summed separately per ticker, then netted;
    /// tickers that net to zero are left out.
    pub fn holdings_on(&self, transactions: &[Transaction], date: NaiveDate) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

        for tx in transactions.iter().filter(|tx| tx.date <= date) {
            let (bought, sold) = sums.entry(tx.ticker.as_str()).or_insert((0.0, 0.0));
            match tx.transaction_type {
                TransactionType::Buy => *bought += tx.amount,
                TransactionType::Sell => *sold += tx.amount,
            }
        }

        sums.into_iter()
            .map(|(ticker, (bought, sold))| (ticker.to_string(), bought - sold))
            .filter(|(_, net)| net.abs() > QUANTITY_EPSILON)
            .collect()
    }

    /// Currency of the most recent transaction in `ticker` at or before `date`.
    ///
    /// Same-date rows are resolved by ledger order (the later row wins).
    /// Falls back to EUR when the ticker has no transaction yet.
    pub fn currency_on(&self, transactions: &[Transaction], ticker: &str, date: NaiveDate) -> String {
        transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.ticker == ticker && tx.date <= date)
            .max_by_key(|(idx, tx)| (tx.date, *idx))
            .map(|(_, tx)| tx.currency.trim().to_uppercase())
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_string())
    }

    /// Nonzero holdings on `date` with their valuation currency, sorted by ticker.
    pub fn positions_on(&self, transactions: &[Transaction], date: NaiveDate) -> Vec<HeldPosition> {
        self.holdings_on(transactions, date)
            .into_iter()
            .map(|(ticker, quantity)| {
                let currency = self.currency_on(transactions, &ticker, date);
                HeldPosition {
                    ticker,
                    quantity,
                    currency,
                }
            })
            .collect()
    }

    /// Date of the oldest transaction, if any.
    pub fn earliest_date(&self, transactions: &[Transaction]) -> Option<NaiveDate> {
        transactions.iter().map(|tx| tx.date).min()
    }

    /// Every ticker that appears in the ledger, sorted.
    pub fn tickers(&self, transactions: &[Transaction]) -> Vec<String> {
        let mut tickers: Vec<String> = transactions.iter().map(|tx| tx.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();
        tickers
    }
}

impl Default for HoldingsService {
    fn default() -> Self {
        Self::new()
    }
}
