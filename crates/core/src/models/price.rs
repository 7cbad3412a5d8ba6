use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::asset::InstrumentType;

/// A single price data point (date → close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Current market data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQuote {
    pub symbol: String,

    /// Latest price in `currency`
    pub price: f64,

    /// Close of the previous session, when the provider reports one
    pub previous_close: Option<f64>,

    /// Quote currency; providers that omit it are assumed to quote in EUR
    pub currency: String,

    pub instrument_type: InstrumentType,
}

impl LiveQuote {
    /// Percentage move from the previous close, if known and non-zero.
    pub fn change_pct(&self) -> Option<f64> {
        match self.previous_close {
            Some(prev) if prev.abs() > f64::EPSILON => Some((self.price - prev) / prev * 100.0),
            _ => None,
        }
    }
}

/// Outcome of a single market-data lookup.
///
/// Lookups inside a backfill never abort the run; an unavailable value is
/// carried as data so callers can tell "fetched zero" from "fetch failed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fetch<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Fetch<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Fetch::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Fetch::Available(_))
    }

    /// The fetched value, discarding the failure reason.
    pub fn value(self) -> Option<T> {
        match self {
            Fetch::Available(v) => Some(v),
            Fetch::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Fetch::Available(_) => None,
            Fetch::Unavailable { reason } => Some(reason),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Fetch<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Fetch::Available(v),
            Err(e) => Fetch::unavailable(e.to_string()),
        }
    }
}

/// Cache key: (symbol, quote currency) e.g. ("ASML.AS", "EUR")
pub type PriceCacheKey = (String, String);

/// In-process cache of historical closes.
///
/// Historical closes are fetched once and kept for the lifetime of the
/// tracker; past prices don't change. Failed lookups are never cached, so a
/// later call retries them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    /// (symbol, currency) → date-sorted Vec of PricePoints
    pub entries: HashMap<PriceCacheKey, Vec<PricePoint>>,
}

fn cache_key(symbol: &str, currency: &str) -> PriceCacheKey {
    (symbol.to_uppercase(), currency.to_uppercase())
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached price for an exact (symbol, currency, date). O(log n).
    pub fn get_price(&self, symbol: &str, currency: &str, date: NaiveDate) -> Option<f64> {
        let entries = self.entries.get(&cache_key(symbol, currency))?;
        entries
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| entries[idx].price)
    }

    /// Latest cached price on or before `date`, no older than `earliest`.
    pub fn get_price_on_or_before(
        &self,
        symbol: &str,
        currency: &str,
        date: NaiveDate,
        earliest: NaiveDate,
    ) -> Option<f64> {
        let entries = self.entries.get(&cache_key(symbol, currency))?;
        let end = entries
            .binary_search_by_key(&date, |p| p.date)
            .map(|pos| pos + 1)
            .unwrap_or_else(|pos| pos);
        entries[..end]
            .last()
            .filter(|p| p.date >= earliest)
            .map(|p| p.price)
    }

    /// Insert or update a price point, keeping date order.
    pub fn set_price(&mut self, symbol: &str, currency: &str, date: NaiveDate, price: f64) {
        let entries = self.entries.entry(cache_key(symbol, currency)).or_default();
        match entries.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => entries[idx].price = price,
            Err(idx) => entries.insert(idx, PricePoint { date, price }),
        }
    }

    pub fn set_prices(&mut self, symbol: &str, currency: &str, points: &[PricePoint]) {
        for point in points {
            self.set_price(symbol, currency, point.date, point.price);
        }
    }

    /// Total number of cached price points across all symbols.
    pub fn total_entries(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
