use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::asset::{is_valid_currency, normalize_currency};

pub const ENV_DATASTORE_URL: &str = "PORTFOLIO_DATASTORE_URL";
pub const ENV_DATASTORE_KEY: &str = "PORTFOLIO_DATASTORE_KEY";
pub const ENV_HOME_CURRENCY: &str = "PORTFOLIO_HOME_CURRENCY";
pub const ENV_PRICE_LOOKBACK_DAYS: &str = "PORTFOLIO_PRICE_LOOKBACK_DAYS";
pub const ENV_BENCHMARK_AEX: &str = "PORTFOLIO_BENCHMARK_AEX";
pub const ENV_BENCHMARK_SP: &str = "PORTFOLIO_BENCHMARK_SP";

/// Largest accepted price look-back window, in calendar days.
pub const MAX_PRICE_LOOKBACK_DAYS: u32 = 14;

/// Process-level configuration, passed explicitly into the tracker at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency every valuation is converted into (e.g. "EUR").
    pub home_currency: String,

    /// Index symbols recorded next to each daily snapshot.
    pub benchmarks: BenchmarkSettings,

    /// How many calendar days before the target date a historical close may
    /// come from. 0 means only a close dated exactly on the target day counts.
    pub price_lookback_days: u32,

    /// Remote datastore; `None` when running against a local store.
    pub datastore: Option<DatastoreSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home_currency: "EUR".to_string(),
            benchmarks: BenchmarkSettings::default(),
            price_lookback_days: 0,
            datastore: None,
        }
    }
}

/// Provider symbols of the two benchmark indices stored per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSettings {
    pub aex: String,
    pub sp: String,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            aex: "^AEX".to_string(),
            sp: "^GSPC".to_string(),
        }
    }
}

/// Connection details for the PostgREST-style remote datastore.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreSettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub api_key: String,
    pub transactions_table: String,
    pub cashflows_table: String,
    pub snapshots_table: String,
}

impl DatastoreSettings {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            transactions_table: "transactions".to_string(),
            cashflows_table: "transactions_div".to_string(),
            snapshots_table: "historic_data".to_string(),
        }
    }
}

// The api key must never end up in logs.
impl std::fmt::Debug for DatastoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreSettings")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("transactions_table", &self.transactions_table)
            .field("cashflows_table", &self.cashflows_table)
            .field("snapshots_table", &self.snapshots_table)
            .finish()
    }
}

impl Settings {
    /// Build settings from `PORTFOLIO_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(currency) = lookup(ENV_HOME_CURRENCY) {
            settings.home_currency = currency;
        }
        if let Some(days) = lookup(ENV_PRICE_LOOKBACK_DAYS) {
            settings.price_lookback_days = days.trim().parse().map_err(|e| {
                CoreError::Config(format!("{ENV_PRICE_LOOKBACK_DAYS}='{days}' is not a number: {e}"))
            })?;
        }
        if let Some(symbol) = lookup(ENV_BENCHMARK_AEX) {
            settings.benchmarks.aex = symbol;
        }
        if let Some(symbol) = lookup(ENV_BENCHMARK_SP) {
            settings.benchmarks.sp = symbol;
        }

        settings.datastore = match (lookup(ENV_DATASTORE_URL), lookup(ENV_DATASTORE_KEY)) {
            (Some(url), Some(key)) => Some(DatastoreSettings::new(url, key)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CoreError::Config(format!(
                    "{ENV_DATASTORE_URL} is set but {ENV_DATASTORE_KEY} is not"
                )))
            }
            (None, Some(_)) => {
                return Err(CoreError::Config(format!(
                    "{ENV_DATASTORE_KEY} is set but {ENV_DATASTORE_URL} is not"
                )))
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants and normalise the home currency code.
    pub fn validate(&mut self) -> Result<(), CoreError> {
        if !is_valid_currency(&self.home_currency) {
            return Err(CoreError::Config(format!(
                "Invalid home currency '{}': must be exactly 3 ASCII letters (e.g., EUR, USD)",
                self.home_currency
            )));
        }
        self.home_currency = normalize_currency(&self.home_currency);

        if self.price_lookback_days > MAX_PRICE_LOOKBACK_DAYS {
            return Err(CoreError::Config(format!(
                "price_lookback_days of {} exceeds maximum of {MAX_PRICE_LOOKBACK_DAYS}",
                self.price_lookback_days
            )));
        }
        if self.benchmarks.aex.trim().is_empty() || self.benchmarks.sp.trim().is_empty() {
            return Err(CoreError::Config("Benchmark symbols must not be empty".into()));
        }
        if let Some(ds) = &self.datastore {
            if !(ds.url.starts_with("https://") || ds.url.starts_with("http://")) {
                return Err(CoreError::Config(format!(
                    "Datastore URL '{}' must start with http:// or https://",
                    ds.url
                )));
            }
            if ds.api_key.trim().is_empty() {
                return Err(CoreError::Config("Datastore api key must not be empty".into()));
            }
        }
        Ok(())
    }
}
