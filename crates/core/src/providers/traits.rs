use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::{LiveQuote, PricePoint};

/// Trait abstraction for all market-data providers.
///
/// For `AssetClass::Currency` the `symbol` is the base currency code and
/// `currency` the quote currency, so a "price" is the exchange rate
/// base → quote. For securities `currency` is informational; providers
/// return closes in the instrument's own trading currency.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which asset classes this provider can handle.
    fn supported_asset_classes(&self) -> Vec<AssetClass>;

    /// Whether `get_historical_price` / `get_price_range` are served at all.
    fn supports_history(&self) -> bool {
        true
    }

    /// Latest price plus the provider's currency and instrument classification.
    async fn get_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError>;

    /// Close dated exactly on `date`.
    async fn get_historical_price(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError>;

    /// All closes between `from` and `to` inclusive, sorted by date.
    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
