use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::serde_helpers::flexible_date;

/// One persisted row of the daily net-worth history (`historic_data` table).
///
/// Written once per business day by the backfill and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    /// Business day this row values; the upsert key
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,

    /// Portfolio value in the home currency, rounded to cents
    pub value: f64,

    /// Value minus net deposits up to `date` (cumulative profit)
    pub wv: f64,

    /// AEX benchmark close, `None` when it could not be fetched
    #[serde(default)]
    pub aex: Option<f64>,

    /// S&P 500 benchmark close, `None` when it could not be fetched
    #[serde(default)]
    pub sp: Option<f64>,
}

/// Latest snapshot date in a table, if any.
pub fn latest_snapshot_date(snapshots: &[DailySnapshot]) -> Option<NaiveDate> {
    snapshots.iter().map(|s| s.date).max()
}
