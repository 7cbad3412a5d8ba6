use tracing::warn;

use crate::models::asset::AssetClass;

use super::frankfurter::FrankfurterProvider;
use super::open_er_api::OpenErApiProvider;
use super::traits::MarketDataProvider;
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of all available market-data providers.
///
/// Routes requests by `AssetClass`; registration order is fallback order.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    ///
    /// Live FX goes to open.er-api first; historical FX to Yahoo
    /// (`XXXEUR=X` pairs) with Frankfurter (ECB) as fallback.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // open.er-api: live fiat rates only, no API key
        registry.register(Box::new(OpenErApiProvider::new()));

        // Yahoo Finance: securities, indices and FX pairs, no API key
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register(Box::new(yahoo)),
            Err(e) => warn!(error = %e, "Yahoo Finance provider unavailable"),
        }

        // Frankfurter: ECB fiat rates, no API key
        registry.register(Box::new(FrankfurterProvider::new()));

        registry
    }

    /// Register a new provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    /// All providers that support the given class, in priority order.
    pub fn get_providers_for(&self, asset_class: AssetClass) -> Vec<&dyn MarketDataProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_asset_classes().contains(&asset_class))
            .map(|p| p.as_ref())
            .collect()
    }

    /// Providers for the class that can answer historical queries.
    pub fn get_history_providers_for(
        &self,
        asset_class: AssetClass,
    ) -> Vec<&dyn MarketDataProvider> {
        self.get_providers_for(asset_class)
            .into_iter()
            .filter(|p| p.supports_history())
            .collect()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
