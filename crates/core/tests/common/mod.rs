// ═══════════════════════════════════════════════════════════════════
// Shared fixtures: stub market-data provider, date helpers
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use portfolio_history_core::errors::CoreError;
use portfolio_history_core::models::asset::{AssetClass, InstrumentType};
use portfolio_history_core::models::price::{LiveQuote, PricePoint};
use portfolio_history_core::providers::registry::ProviderRegistry;
use portfolio_history_core::providers::traits::MarketDataProvider;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Provider answering from fixed tables. Symbols in `failing` always error.
#[derive(Default)]
pub struct StubProvider {
    pub name: String,
    pub classes: Vec<AssetClass>,
    pub closes: HashMap<(String, String, NaiveDate), f64>,
    pub quotes: HashMap<(String, String), LiveQuote>,
    pub failing: HashSet<String>,
    pub history: bool,
    pub calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(name: &str, classes: Vec<AssetClass>) -> Self {
        Self {
            name: name.to_string(),
            classes,
            history: true,
            ..Self::default()
        }
    }

    pub fn close(mut self, symbol: &str, currency: &str, date: NaiveDate, price: f64) -> Self {
        self.closes
            .insert((symbol.to_string(), currency.to_string(), date), price);
        self
    }

    pub fn quote(
        mut self,
        symbol: &str,
        currency: &str,
        price: f64,
        previous_close: Option<f64>,
        instrument_type: InstrumentType,
    ) -> Self {
        self.quotes.insert(
            (symbol.to_string(), currency.to_string()),
            LiveQuote {
                symbol: symbol.to_string(),
                price,
                previous_close,
                currency: currency.to_string(),
                instrument_type,
            },
        );
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn live_only(mut self) -> Self {
        self.history = false;
        self
    }

    /// Counter shared with the provider after it is boxed into a registry.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn unavailable(symbol: &str, currency: &str, date: &str) -> CoreError {
        CoreError::PriceNotAvailable {
            symbol: symbol.into(),
            currency: currency.into(),
            date: date.into(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        self.classes.clone()
    }

    fn supports_history(&self) -> bool {
        self.history
    }

    async fn get_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            return Err(CoreError::Network(format!("{symbol}: connection reset")));
        }
        // Securities quote in their own currency whatever was asked for.
        self.quotes
            .iter()
            .find(|((s, c), _)| {
                s == symbol && (asset_class == AssetClass::Security || c == currency)
            })
            .map(|(_, q)| q.clone())
            .ok_or_else(|| Self::unavailable(symbol, currency, "live"))
    }

    async fn get_historical_price(
        &self,
        symbol: &str,
        currency: &str,
        _asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            return Err(CoreError::Network(format!("{symbol}: connection reset")));
        }
        self.closes
            .get(&(symbol.to_string(), currency.to_string(), date))
            .copied()
            .ok_or_else(|| Self::unavailable(symbol, currency, &date.to_string()))
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        _asset_class: AssetClass,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            return Err(CoreError::Network(format!("{symbol}: connection reset")));
        }
        let mut points: Vec<PricePoint> = self
            .closes
            .iter()
            .filter(|((s, c, d), _)| s == symbol && c == currency && *d >= from && *d <= to)
            .map(|((_, _, d), price)| PricePoint {
                date: *d,
                price: *price,
            })
            .collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

pub fn registry_with(providers: Vec<StubProvider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Box::new(provider));
    }
    registry
}
