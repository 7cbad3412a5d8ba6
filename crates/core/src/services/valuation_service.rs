use chrono::NaiveDate;
use tracing::warn;

use super::currency_service::CurrencyService;
use super::holdings_service::HeldPosition;
use super::price_service::PriceService;
use super::round_cents;
use crate::models::asset::AssetClass;
use crate::models::price::{Fetch, PriceCache};
use crate::models::valuation::{DayValuation, TickerValuation};

/// Values a set of holdings in the home currency as of a past date.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Price every position on `date` and convert it into the home currency.
    ///
    /// A ticker whose close or FX rate can't be fetched contributes zero and
    /// is reported in the result; it never fails the whole day.
    pub async fn value_on(
        &self,
        price_service: &PriceService,
        currency_service: &CurrencyService,
        cache: &mut PriceCache,
        positions: &[HeldPosition],
        date: NaiveDate,
    ) -> DayValuation {
        let mut tickers = Vec::with_capacity(positions.len());

        for position in positions {
            let price = price_service
                .historical_close(
                    cache,
                    &position.ticker,
                    &position.currency,
                    AssetClass::Security,
                    date,
                )
                .await;

            // Skip the FX lookup when there's nothing to convert.
            let fx_rate = if price.is_available() {
                currency_service
                    .historical_rate_to_home(price_service, cache, &position.currency, date)
                    .await
            } else {
                Fetch::unavailable("price unavailable")
            };

            let valuation = TickerValuation {
                ticker: position.ticker.clone(),
                quantity: position.quantity,
                currency: position.currency.clone(),
                price,
                fx_rate,
            };
            if let Some(reason) = valuation.skip_reason() {
                warn!(ticker = %position.ticker, %date, %reason, "ticker skipped");
            }
            tickers.push(valuation);
        }

        let total = round_cents(tickers.iter().filter_map(TickerValuation::value).sum());

        DayValuation {
            date,
            home_currency: currency_service.home_currency().to_string(),
            total,
            tickers,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
