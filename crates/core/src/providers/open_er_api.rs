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

const BASE_URL: &str = "https://open.er-api.com/v6";

/// ExchangeRate-API open endpoint for the current fiat rate.
///
/// - **Free**: No API key; rates refresh once a day.
/// - **Live only**: no historical endpoint on the open tier, so the
///   registry never routes historical lookups here.
pub struct OpenErApiProvider {
    client: Client,
    base_url: String,
}

impl OpenErApiProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

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

    fn no_history() -> CoreError {
        CoreError::Api {
            provider: "open.er-api".into(),
            message: "historical rates are not offered".into(),
        }
    }
}

impl Default for OpenErApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

#[async_trait]
impl MarketDataProvider for OpenErApiProvider {
    fn name(&self) -> &str {
        "open.er-api"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Currency]
    }

    fn supports_history(&self) -> bool {
        false
    }

    async fn get_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError> {
        if asset_class != AssetClass::Currency {
            return Err(CoreError::Api {
                provider: "open.er-api".into(),
                message: format!("{symbol} is not a currency"),
            });
        }
        let base = normalize_currency(symbol);
        let target = normalize_currency(currency);

        let price = if base == target {
            1.0
        } else {
            let url = format!("{}/latest/{base}", self.base_url);
            let resp: LatestResponse = self
                .client
                .get(&url)
                .send()
                .await?
                .json()
                .await
                .map_err(|e| CoreError::Api {
                    provider: "open.er-api".into(),
                    message: format!("Failed to parse latest rates for {base}: {e}"),
                })?;

            if resp.result != "success" {
                return Err(CoreError::Api {
                    provider: "open.er-api".into(),
                    message: format!(
                        "Request for {base} failed: {}",
                        resp.error_type.unwrap_or_else(|| resp.result.clone())
                    ),
                });
            }
            resp.rates.get(&target).copied().ok_or_else(|| CoreError::Api {
                provider: "open.er-api".into(),
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
        _symbol: &str,
        _currency: &str,
        _asset_class: AssetClass,
        _date: NaiveDate,
    ) -> Result<f64, CoreError> {
        Err(Self::no_history())
    }

    async fn get_price_range(
        &self,
        _symbol: &str,
        _currency: &str,
        _asset_class: AssetClass,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Err(Self::no_history())
    }
}
