use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::asset::{normalize_currency, AssetClass, InstrumentType};
use crate::models::price::{LiveQuote, PricePoint};

const BASE_URL: &str = "https://api.frankfurter.dev/v1";

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) reference rates.
/// - **Endpoints**: `/latest`, `/{date}`, `/{start}..{end}`
///
/// The ECB publishes on TARGET business days only; requests for other days
/// answer with the preceding publication, so `get_historical_price` checks
/// the returned date.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at another deployment (self-hosted Frankfurter).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn unsupported(what: &str) -> CoreError {
        CoreError::Api {
            provider: "Frankfurter".into(),
            message: format!("{what} is only available for currencies"),
        }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct RatesResponse {
    date: String,
    rates: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct TimeSeriesResponse {
    rates: HashMap<String, HashMap<String, f64>>,
}

#[async_trait]
impl MarketDataProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Currency]
    }

    async fn get_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError> {
        if asset_class != AssetClass::Currency {
            return Err(Self::unsupported("Live quote"));
        }
        let base = normalize_currency(symbol);
        let target = normalize_currency(currency);

        let price = if base == target {
            1.0
        } else {
            let url = format!("{}/latest?base={base}&symbols={target}", self.base_url);
            let resp: RatesResponse = self
                .client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .map_err(|e| CoreError::Api {
                    provider: "Frankfurter".into(),
                    message: format!("Failed to parse response for {base}/{target}: {e}"),
                })?;
            resp.rates.get(&target).copied().ok_or_else(|| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("No rate found for {base} → {target}"),
            })?
        };

        Ok(LiveQuote {
            symbol: base,
            price,
            previous_close: None,
            currency: target,
            instrument_type: InstrumentType::Currency,
        })
    }

    async fn get_historical_price(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        if asset_class != AssetClass::Currency {
            return Err(Self::unsupported("Historical price"));
        }
        let base = normalize_currency(symbol);
        let target = normalize_currency(currency);

        if base == target {
            return Ok(1.0);
        }

        let date_str = date.format("%Y-%m-%d").to_string();
        let url = format!("{}/{date_str}?base={base}&symbols={target}", self.base_url);

        let resp: RatesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("Failed to parse historical rate for {base}/{target} on {date}: {e}"),
            })?;

        let not_available = || CoreError::PriceNotAvailable {
            symbol: base.clone(),
            currency: target.clone(),
            date: date.to_string(),
        };

        if resp.date != date_str {
            return Err(not_available());
        }
        resp.rates.get(&target).copied().ok_or_else(not_available)
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        if asset_class != AssetClass::Currency {
            return Err(Self::unsupported("Price range"));
        }
        let base = normalize_currency(symbol);
        let target = normalize_currency(currency);

        if base == target {
            return Ok(from
                .iter_days()
                .take_while(|d| *d <= to)
                .map(|date| PricePoint { date, price: 1.0 })
                .collect());
        }

        let from_str = from.format("%Y-%m-%d");
        let to_str = to.format("%Y-%m-%d");
        let url = format!(
            "{}/{from_str}..{to_str}?base={base}&symbols={target}",
            self.base_url
        );

        let resp: TimeSeriesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("Failed to parse time series for {base}/{target}: {e}"),
            })?;

        let mut points: Vec<PricePoint> = resp
            .rates
            .iter()
            .filter_map(|(date_str, rates)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                let price = rates.get(&target)?;
                Some(PricePoint { date, price: *price })
            })
            .filter(|p| p.date >= from && p.date <= to)
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
