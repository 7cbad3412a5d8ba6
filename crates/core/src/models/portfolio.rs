use serde::{Deserialize, Serialize};

use super::asset::InstrumentType;

/// One line of the live portfolio table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,

    /// Net shares currently held
    pub quantity: f64,

    /// Latest price in `currency`, `None` when the live quote failed
    pub price: Option<f64>,

    /// Quote currency reported by the provider
    pub currency: Option<String>,

    /// `currency` → home currency rate, `None` when the lookup failed
    pub fx_to_home: Option<f64>,

    /// Position value in the home currency (0 when price or FX is missing)
    pub value_home: f64,

    pub instrument_type: Option<InstrumentType>,

    /// Move since the previous close, in percent
    pub change_pct_1d: Option<f64>,
}

/// Live valuation of all current holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub home_currency: String,

    /// Sorted by `value_home`, largest first
    pub positions: Vec<Position>,

    /// Sum of `value_home`, rounded to cents
    pub total_value: f64,

    /// Value-weighted 1-day change over positions with a known change
    pub weighted_change_pct_1d: f64,
}

/// One leaf of the allocation breakdown (instrument type → ticker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub instrument_type: InstrumentType,
    pub ticker: String,
    pub value_home: f64,

    /// Share of the total allocated value, in percent
    pub allocation_pct: f64,
}
