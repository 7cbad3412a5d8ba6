use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cashflow::CashflowType;

/// A deposit or withdrawal with the running balance of external money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub date: NaiveDate,
    pub cashflow_type: CashflowType,

    /// Signed movement on this date
    pub amount: f64,

    /// Net deposits up to and including this record
    pub cumulative_total: f64,
}

/// Dividend totals for one paying ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendSummary {
    pub ticker: String,
    pub gross: f64,

    /// Withheld tax, always ≤ 0
    pub tax: f64,

    /// gross + tax
    pub net: f64,
}

/// Per-ticker dividend breakdown plus portfolio totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendBreakdown {
    /// Sorted by ticker
    pub by_ticker: Vec<DividendSummary>,
    pub total_net: f64,
    pub total_tax: f64,
}

/// A dated value of one performance series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// History of the portfolio next to its benchmarks and deposits.
///
/// Benchmark series skip days whose close is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSeries {
    pub value: Vec<SeriesPoint>,
    pub wv: Vec<SeriesPoint>,
    pub aex: Vec<SeriesPoint>,
    pub sp: Vec<SeriesPoint>,
    pub deposits: Vec<SeriesPoint>,
}
