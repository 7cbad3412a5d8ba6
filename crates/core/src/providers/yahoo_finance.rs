use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::{YResponse, YahooConnector};

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::asset::{normalize_currency, AssetClass, InstrumentType};
use crate::models::price::{LiveQuote, PricePoint};

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance provider for securities, benchmark indices and FX pairs.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices (`^AEX`, `^GSPC`), and
///   currency crosses via `{BASE}{QUOTE}=X` symbols.
/// - Closes are returned in the instrument's trading currency.
pub struct YahooFinanceProvider {
    connector: YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = YahooConnector::new().map_err(|e| api_error(format!(
            "Failed to create connector: {e}"
        )))?;
        Ok(Self { connector })
    }

    /// Yahoo symbol for an exchange rate, e.g. ("USD", "EUR") → "USDEUR=X".
    pub fn fx_symbol(base: &str, quote: &str) -> String {
        format!("{}{}=X", normalize_currency(base), normalize_currency(quote))
    }

    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month = time::Month::try_from(date.month() as u8)
            .map_err(|e| api_error(format!("Invalid month in {date}: {e}")))?;
        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| api_error(format!("Invalid date {date}: {e}")))?
            .midnight()
            .assume_utc();
        Ok(odt)
    }

    /// Daily bars are stamped at the session open; shifting by the exchange's
    /// UTC offset gives the trading date they belong to.
    fn local_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
    }

    fn gmt_offset(resp: &YResponse) -> i64 {
        resp.metadata().map(|m| m.gmtoffset as i64).unwrap_or(0)
    }

    /// Resolve (symbol, currency) to the Yahoo ticker for the given class.
    fn resolve_symbol(symbol: &str, currency: &str, asset_class: AssetClass) -> String {
        match asset_class {
            AssetClass::Currency => Self::fx_symbol(symbol, currency),
            AssetClass::Security => symbol.trim().to_string(),
        }
    }

    async fn daily_points(
        &self,
        yahoo_symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        // Pad the window by a day on each side so bars stamped across
        // midnight UTC are not lost; filtering happens on the local date.
        let start = Self::to_offset_datetime(from - Duration::days(1))?;
        let end = Self::to_offset_datetime(to + Duration::days(2))?;

        let resp = self
            .connector
            .get_quote_history(yahoo_symbol, start, end)
            .await
            .map_err(|e| api_error(format!("Failed to fetch history for {yahoo_symbol}: {e}")))?;

        let quotes = resp
            .quotes()
            .map_err(|e| api_error(format!("Failed to parse quotes for {yahoo_symbol}: {e}")))?;
        let offset = Self::gmt_offset(&resp);

        let mut points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::local_date(q.timestamp as i64, offset)?;
                (date >= from && date <= to && q.close.is_finite()).then_some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Ok(points)
    }
}

fn api_error(message: String) -> CoreError {
    CoreError::Api {
        provider: PROVIDER.into(),
        message,
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Security, AssetClass::Currency]
    }

    async fn get_live_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
    ) -> Result<LiveQuote, CoreError> {
        let yahoo_symbol = Self::resolve_symbol(symbol, currency, asset_class);

        let resp = self
            .connector
            .get_quote_range(&yahoo_symbol, "1d", "5d")
            .await
            .map_err(|e| api_error(format!("Failed to fetch latest quote for {yahoo_symbol}: {e}")))?;

        let quotes = resp
            .quotes()
            .map_err(|e| api_error(format!("No quote data for {yahoo_symbol}: {e}")))?;
        let last = quotes
            .last()
            .ok_or_else(|| api_error(format!("Empty quote series for {yahoo_symbol}")))?;
        let previous_close = quotes.len().checked_sub(2).map(|i| quotes[i].close);

        let (quote_currency, instrument_type) = match resp.metadata() {
            Ok(meta) => {
                let currency_field: Option<String> = meta.currency.clone().into();
                let type_field: Option<String> = meta.instrument_type.clone().into();
                (currency_field, type_field)
            }
            Err(e) => {
                debug!(symbol = %yahoo_symbol, error = %e, "quote metadata missing");
                (None, None)
            }
        };

        let currency = match asset_class {
            AssetClass::Currency => normalize_currency(currency),
            AssetClass::Security => quote_currency
                .filter(|c| !c.trim().is_empty())
                .map(|c| normalize_currency(&c))
                .unwrap_or_else(|| "EUR".to_string()),
        };
        let instrument_type = match asset_class {
            AssetClass::Currency => InstrumentType::Currency,
            AssetClass::Security => instrument_type
                .map(|t| InstrumentType::from_provider_code(&t))
                .unwrap_or_else(|| InstrumentType::Other("UNKNOWN".into())),
        };

        Ok(LiveQuote {
            symbol: symbol.to_string(),
            price: last.close,
            previous_close,
            currency,
            instrument_type,
        })
    }

    async fn get_historical_price(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        date: NaiveDate,
    ) -> Result<f64, CoreError> {
        let yahoo_symbol = Self::resolve_symbol(symbol, currency, asset_class);
        let points = self.daily_points(&yahoo_symbol, date, date).await?;

        points
            .into_iter()
            .find(|p| p.date == date)
            .map(|p| p.price)
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: yahoo_symbol,
                currency: currency.to_string(),
                date: date.to_string(),
            })
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        asset_class: AssetClass,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let yahoo_symbol = Self::resolve_symbol(symbol, currency, asset_class);
        self.daily_points(&yahoo_symbol, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fx_symbol_format() {
        assert_eq!(YahooFinanceProvider::fx_symbol("usd", "EUR"), "USDEUR=X");
        assert_eq!(YahooFinanceProvider::fx_symbol(" HKD", "eur "), "HKDEUR=X");
    }

    #[test]
    fn symbols_resolve_by_asset_class() {
        assert_eq!(
            YahooFinanceProvider::resolve_symbol("USD", "EUR", AssetClass::Currency),
            "USDEUR=X"
        );
        assert_eq!(
            YahooFinanceProvider::resolve_symbol("IBM", "USD", AssetClass::Security),
            "IBM"
        );
        assert_eq!(
            YahooFinanceProvider::resolve_symbol(" ^AEX ", "EUR", AssetClass::Security),
            "^AEX"
        );
    }

    #[test]
    fn local_date_applies_exchange_offset() {
        // 2024-01-01T23:00:00Z is already 2024-01-02 in Amsterdam (UTC+1).
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        assert_eq!(
            YahooFinanceProvider::local_date(ts, 3600),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(
            YahooFinanceProvider::local_date(ts, 0),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn offset_datetime_is_midnight_utc() {
        let odt = YahooFinanceProvider::to_offset_datetime(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
            .unwrap();
        assert_eq!(odt.year(), 2024);
        assert_eq!(odt.month(), time::Month::February);
        assert_eq!(odt.day(), 29);
        assert_eq!(odt.hour(), 0);
    }
}
