use chrono::NaiveDate;

use super::price_service::PriceService;
use crate::models::asset::{normalize_currency, AssetClass};
use crate::models::price::{Fetch, PriceCache};

/// Converts amounts from a quote currency into the home currency.
///
/// Rates come from the currency providers via [`PriceService`]; converting
/// the home currency to itself never touches the network.
pub struct CurrencyService {
    home_currency: String,
}

impl CurrencyService {
    pub fn new(home_currency: &str) -> Self {
        Self {
            home_currency: normalize_currency(home_currency),
        }
    }

    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    fn is_home(&self, currency: &str) -> bool {
        normalize_currency(currency) == self.home_currency
    }

    /// Units of home currency per one unit of `currency` on `date`.
    /// E.g. with a EUR home, ("USD", 2024-01-02) → ~0.91
    pub async fn historical_rate_to_home(
        &self,
        price_service: &PriceService,
        cache: &mut PriceCache,
        currency: &str,
        date: NaiveDate,
    ) -> Fetch<f64> {
        if self.is_home(currency) {
            return Fetch::Available(1.0);
        }
        price_service
            .historical_close(
                cache,
                &normalize_currency(currency),
                &self.home_currency,
                AssetClass::Currency,
                date,
            )
            .await
    }

    /// Current units of home currency per one unit of `currency`.
    pub async fn live_rate_to_home(&self, price_service: &PriceService, currency: &str) -> Fetch<f64> {
        if self.is_home(currency) {
            return Fetch::Available(1.0);
        }
        match price_service
            .live_quote(&normalize_currency(currency), &self.home_currency, AssetClass::Currency)
            .await
        {
            Fetch::Available(quote) => Fetch::Available(quote.price),
            Fetch::Unavailable { reason } => Fetch::Unavailable { reason },
        }
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new("EUR")
    }
}
