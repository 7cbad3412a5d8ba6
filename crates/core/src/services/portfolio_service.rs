use std::collections::BTreeMap;
use tracing::warn;

use super::currency_service::CurrencyService;
use super::price_service::PriceService;
use super::round_cents;
use crate::models::asset::AssetClass;
use crate::models::portfolio::{AllocationSlice, PortfolioOverview, Position};
use crate::models::price::Fetch;

/// Live view of current holdings: prices, home-currency values, daily moves.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Price each holding with its latest quote and convert to the home currency.
    ///
    /// `holdings` maps ticker → (quantity, ledger currency). A ticker whose
    /// quote or FX rate fails is still listed, valued at 0.
    pub async fn overview(
        &self,
        price_service: &PriceService,
        currency_service: &CurrencyService,
        holdings: &BTreeMap<String, (f64, String)>,
    ) -> PortfolioOverview {
        let mut positions = Vec::with_capacity(holdings.len());

        for (ticker, (quantity, ledger_currency)) in holdings {
            let quote = match price_service
                .live_quote(ticker, ledger_currency, AssetClass::Security)
                .await
            {
                Fetch::Available(quote) => quote,
                Fetch::Unavailable { reason } => {
                    warn!(%ticker, %reason, "no live quote");
                    positions.push(Position {
                        ticker: ticker.clone(),
                        quantity: *quantity,
                        price: None,
                        currency: None,
                        fx_to_home: None,
                        value_home: 0.0,
                        instrument_type: None,
                        change_pct_1d: None,
                    });
                    continue;
                }
            };

            let fx_to_home = currency_service
                .live_rate_to_home(price_service, &quote.currency)
                .await;
            if let Some(reason) = fx_to_home.reason() {
                warn!(%ticker, currency = %quote.currency, %reason, "no live FX rate");
            }
            let fx_to_home = fx_to_home.value();

            let native_value = round_cents(quote.price * quantity);
            let value_home = fx_to_home
                .map(|fx| round_cents(native_value * fx))
                .unwrap_or(0.0);

            positions.push(Position {
                ticker: ticker.clone(),
                quantity: *quantity,
                price: Some(quote.price),
                change_pct_1d: quote.change_pct(),
                currency: Some(quote.currency),
                fx_to_home,
                value_home,
                instrument_type: Some(quote.instrument_type),
            });
        }

        positions.sort_by(|a, b| b.value_home.total_cmp(&a.value_home));

        PortfolioOverview {
            home_currency: currency_service.home_currency().to_string(),
            total_value: round_cents(positions.iter().map(|p| p.value_home).sum()),
            weighted_change_pct_1d: self.weighted_change(&positions),
            positions,
        }
    }

    /// Value-weighted 1-day change over positions that have one; 0 if none do.
    pub fn weighted_change(&self, positions: &[Position]) -> f64 {
        let (weighted, weight) = positions
            .iter()
            .filter_map(|p| p.change_pct_1d.map(|chg| (chg, p.value_home)))
            .fold((0.0, 0.0), |(sum, total), (chg, value)| (sum + chg * value, total + value));

        if weight.abs() < f64::EPSILON {
            0.0
        } else {
            weighted / weight
        }
    }

    /// Allocation by instrument type, then ticker. Only positive values count.
    pub fn allocation(&self, overview: &PortfolioOverview) -> Vec<AllocationSlice> {
        let priced: Vec<&Position> = overview
            .positions
            .iter()
            .filter(|p| p.value_home > 0.0)
            .collect();
        let total: f64 = priced.iter().map(|p| p.value_home).sum();
        if total <= 0.0 {
            return Vec::new();
        }

        let mut slices: Vec<AllocationSlice> = priced
            .into_iter()
            .filter_map(|p| {
                let instrument_type = p.instrument_type.clone()?;
                Some(AllocationSlice {
                    instrument_type,
                    ticker: p.ticker.clone(),
                    value_home: p.value_home,
                    allocation_pct: p.value_home / total * 100.0,
                })
            })
            .collect();

        slices.sort_by(|a, b| {
            a.instrument_type
                .to_string()
                .cmp(&b.instrument_type.to_string())
                .then(b.value_home.total_cmp(&a.value_home))
        });
        slices
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
