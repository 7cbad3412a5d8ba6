use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::price::Fetch;
use super::snapshot::DailySnapshot;

/// How one held ticker contributed to a day's valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerValuation {
    pub ticker: String,

    /// Net shares held at the end of the day
    pub quantity: f64,

    /// Currency of the most recent transaction at or before the day
    pub currency: String,

    /// Close in `currency`
    pub price: Fetch<f64>,

    /// `currency` → home currency rate; not looked up when the price is unavailable
    pub fx_rate: Fetch<f64>,
}

impl TickerValuation {
    /// price × quantity × fx, or `None` when either lookup failed.
    pub fn value(&self) -> Option<f64> {
        match (&self.price, &self.fx_rate) {
            (Fetch::Available(price), Fetch::Available(fx)) => Some(price * self.quantity * fx),
            _ => None,
        }
    }

    /// Why this ticker was left out of the total, if it was.
    pub fn skip_reason(&self) -> Option<String> {
        if let Some(reason) = self.price.reason() {
            return Some(format!("price unavailable: {reason}"));
        }
        self.fx_rate
            .reason()
            .map(|reason| format!("no {} FX rate: {reason}", self.currency))
    }
}

/// Valuation of the whole portfolio on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayValuation {
    pub date: NaiveDate,
    pub home_currency: String,

    /// Sum of all available contributions, rounded to cents
    pub total: f64,

    pub tickers: Vec<TickerValuation>,
}

impl DayValuation {
    /// Tickers excluded from `total` because a lookup failed.
    pub fn skipped(&self) -> impl Iterator<Item = &TickerValuation> {
        self.tickers.iter().filter(|t| t.value().is_none())
    }
}

/// A ticker that was left out of a backfilled day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub date: NaiveDate,
    pub ticker: String,
    pub reason: String,
}

/// A benchmark close that could not be fetched for a backfilled day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingBenchmark {
    pub date: NaiveDate,
    pub symbol: String,
    pub reason: String,
}

/// Result of one backfill invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Correlates this run's log lines
    pub run_id: Uuid,

    /// Rows written by this run, ascending by date (empty when up to date)
    pub new_rows: Vec<DailySnapshot>,

    pub skipped_tickers: Vec<SkippedTicker>,
    pub missing_benchmarks: Vec<MissingBenchmark>,

    /// Full snapshot table after the run, ascending by date
    pub snapshots: Vec<DailySnapshot>,
}

impl BackfillReport {
    /// `true` when nothing was missing and no row was written.
    pub fn was_up_to_date(&self) -> bool {
        self.new_rows.is_empty()
    }
}
