use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::{Fetch, LiveQuote, PriceCache, PricePoint};
use crate::providers::registry::ProviderRegistry;

/// Fetches prices from market-data providers with caching and fallback.
///
/// Cache strategy:
/// - **Historical closes**: fetched once, cached for the tracker's lifetime.
///   Past prices don't change.
/// - **Live quotes**: never cached; each call hits the providers.
/// - **Failures**: never cached, so the next call retries them.
///
/// Public lookups return [`Fetch`] rather than `Result`: a missing price is
/// data for the caller to report, not an error that aborts a backfill.
pub struct PriceService {
    registry: ProviderRegistry,
    lookback_days: u32,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry, lookback_days: u32) -> Self {
        Self {
            registry,
            lookback_days,
        }
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Check if at least one provider is registered for an asset class.
    pub fn has_provider_for(&self, asset_class: AssetClass) -> bool {
        !self.registry.get_providers_for(asset_class).is_empty()
    }

    /// Names of the providers serving an asset class, in fallback order.
    pub fn get_provider_names(&self, asset_class: AssetClass) -> Vec<String> {
        self.registry
            .get_providers_for(asset_class)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Closing price of `symbol` (quoted in `currency`) on `date`.
    ///
    /// With a zero look-back only a close dated exactly `date` counts;
    /// otherwise the latest close within `lookback_days` before it is used.
    pub async fn historical_close(
        &self,
        cache: &mut PriceCache,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Fetch<f64> {
        let result = self
            .get_historical_close(cache, symbol, currency, asset_class, date)
            .await;
        if let Err(e) = &result {
            debug!(symbol, currency, %date, error = %e, "historical close unavailable");
        }
        result.into()
    }

    /// Latest quote for `symbol`, with fallback across providers.
    pub async fn live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Fetch<LiveQuote> {
        let result = self.fetch_live_quote(symbol, currency, asset_class).await;
        if let Err(e) = &result {
            debug!(symbol, currency, error = %e, "live quote unavailable");
        }
        result.into()
    }

    async fn get_historical_close(
        &self,
        cache: &mut PriceCache,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        let earliest = date - Duration::days(i64::from(self.lookback_days));

        if let Some(price) = cache.get_price(symbol, currency, date) {
            return Ok(price);
        }
        if self.lookback_days == 0 {
            let price = self.fetch_exact(symbol, currency, asset_class, date).await?;
            cache.set_price(symbol, currency, date, price);
            return Ok(price);
        }

        let points = self
            .fetch_range(symbol, currency, asset_class, earliest, date)
            .await?;
        cache.set_prices(symbol, currency, &points);
        cache
            .get_price_on_or_before(symbol, currency, date, earliest)
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency: currency.to_string(),
                date: date.to_string(),
            })
    }

    /// Fetch a single close from history providers with automatic fallback.
    ///
    /// Tries providers in registration order; a provider that errors or
    /// returns a non-finite or negative price hands over to the next one.
    async fn fetch_exact(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        let providers = self.registry.get_history_providers_for(asset_class);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset_class.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider
                .get_historical_price(symbol, currency, asset_class, date)
                .await
            {
                Ok(price) => match validate_price(provider.name(), symbol, price) {
                    Ok(price) => return Ok(price),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    debug!(provider = provider.name(), symbol, %date, error = %e, "provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset_class.to_string())))
    }

    async fn fetch_range(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let providers = self.registry.get_history_providers_for(asset_class);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset_class.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider
                .get_price_range(symbol, currency, asset_class, from, to)
                .await
            {
                Ok(points) => {
                    let valid: Vec<_> = points
                        .into_iter()
                        .filter(|p| p.price.is_finite() && p.price >= 0.0)
                        .collect();
                    if !valid.is_empty() {
                        return Ok(valid);
                    }
                    last_error = Some(CoreError::PriceNotAvailable {
                        symbol: symbol.to_string(),
                        currency: currency.to_string(),
                        date: format!("{from}..{to}"),
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset_class.to_string())))
    }

    async fn fetch_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError> {
        let providers = self.registry.get_providers_for(asset_class);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset_class.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            match provider.get_live_quote(symbol, currency, asset_class).await {
                Ok(quote) => match validate_price(provider.name(), symbol, quote.price) {
                    Ok(_) => return Ok(quote),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    warn!(provider = provider.name(), symbol, error = %e, "live quote failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset_class.to_string())))
    }
}

fn validate_price(provider: &str, symbol: &str, price: f64) -> Result<f64, CoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::Api {
            provider: provider.to_string(),
            message: format!(
                "Invalid price returned for {symbol}: {price} (must be finite and non-negative)"
            ),
        });
    }
    Ok(price)
}
