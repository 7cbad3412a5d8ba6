pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use models::{
    cashflow::CashflowRecord,
    chart::{CashFlowPoint, DividendBreakdown, PerformanceSeries},
    portfolio::{AllocationSlice, PortfolioOverview},
    price::PriceCache,
    settings::Settings,
    snapshot::DailySnapshot,
    transaction::Transaction,
    valuation::{BackfillReport, DayValuation},
};
use providers::registry::ProviderRegistry;
use services::{
    cashflow_service::CashflowService,
    currency_service::CurrencyService,
    history_service::{BackfillContext, HistoryService},
    holdings_service::HoldingsService,
    ledger_service::LedgerService,
    performance_service::PerformanceService,
    portfolio_service::PortfolioService,
    price_service::PriceService,
    valuation_service::ValuationService,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{
    supabase::SupabaseStore,
    traits::{LedgerStore, SnapshotStore},
};
use tracing::info;

use errors::CoreError;

/// Main entry point for the Portfolio History core library.
/// Holds the configured stores, the price cache and all services operating on them.
#[must_use]
pub struct PortfolioTracker {
    settings: Settings,
    ledger: Arc<dyn LedgerStore>,
    snapshots: Arc<dyn SnapshotStore>,
    price_cache: PriceCache,
    holdings_service: HoldingsService,
    cashflow_service: CashflowService,
    price_service: PriceService,
    currency_service: CurrencyService,
    valuation_service: ValuationService,
    history_service: HistoryService,
    portfolio_service: PortfolioService,
    performance_service: PerformanceService,
    ledger_service: LedgerService,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("settings", &self.settings)
            .field("ledger", &self.ledger.backend_name())
            .field("snapshots", &self.snapshots.backend_name())
            .field("cached_prices", &self.price_cache.total_entries())
            .finish()
    }
}

impl PortfolioTracker {
    /// Build a tracker over explicit stores and providers.
    pub fn new(
        mut settings: Settings,
        ledger: Arc<dyn LedgerStore>,
        snapshots: Arc<dyn SnapshotStore>,
        registry: ProviderRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            price_service: PriceService::new(registry, settings.price_lookback_days),
            currency_service: CurrencyService::new(&settings.home_currency),
            history_service: HistoryService::new(settings.benchmarks.clone()),
            holdings_service: HoldingsService::new(),
            cashflow_service: CashflowService::new(),
            valuation_service: ValuationService::new(),
            portfolio_service: PortfolioService::new(),
            performance_service: PerformanceService::new(),
            ledger_service: LedgerService::new(),
            price_cache: PriceCache::new(),
            settings,
            ledger,
            snapshots,
        })
    }

    /// Build a tracker against the remote datastore configured in `settings`,
    /// with the default market-data providers.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        let datastore = settings.datastore.clone().ok_or_else(|| {
            CoreError::Config("No datastore configured (set PORTFOLIO_DATASTORE_URL and PORTFOLIO_DATASTORE_KEY)".into())
        })?;
        let store = Arc::new(SupabaseStore::new(datastore));
        Self::new(
            settings,
            store.clone(),
            store,
            ProviderRegistry::new_with_defaults(),
        )
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Daily History ───────────────────────────────────────────────

    /// Backfill every missing business day up to yesterday (UTC).
    pub async fn backfill_history(&mut self) -> Result<BackfillReport, CoreError> {
        let today = chrono::Utc::now().date_naive();
        self.backfill_history_as_of(today).await
    }

    /// Backfill every missing business day before `today`.
    pub async fn backfill_history_as_of(
        &mut self,
        today: NaiveDate,
    ) -> Result<BackfillReport, CoreError> {
        let ctx = BackfillContext {
            price_service: &self.price_service,
            currency_service: &self.currency_service,
            ledger: self.ledger.as_ref(),
            snapshots: self.snapshots.as_ref(),
        };
        self.history_service
            .backfill(ctx, &mut self.price_cache, today)
            .await
    }

    /// The persisted snapshot table, ascending by date.
    pub async fn snapshots(&self) -> Result<Vec<DailySnapshot>, CoreError> {
        let mut rows = self.snapshots.snapshots().await?;
        rows.sort_by_key(|s| s.date);
        Ok(rows)
    }

    // ── Holdings & Valuation ────────────────────────────────────────

    /// Net quantity per ticker as of `date` (inclusive).
    pub async fn holdings_on(&self, date: NaiveDate) -> Result<BTreeMap<String, f64>, CoreError> {
        let transactions = self.ledger.transactions().await?;
        Ok(self.holdings_service.holdings_on(&transactions, date))
    }

    /// Value the holdings of `date` with that day's closes and FX rates.
    pub async fn value_on(&mut self, date: NaiveDate) -> Result<DayValuation, CoreError> {
        let transactions = self.ledger.transactions().await?;
        let positions = self.holdings_service.positions_on(&transactions, date);
        Ok(self
            .valuation_service
            .value_on(
                &self.price_service,
                &self.currency_service,
                &mut self.price_cache,
                &positions,
                date,
            )
            .await)
    }

    // ── Live Portfolio ──────────────────────────────────────────────

    /// Current holdings priced with live quotes.
    /// `tickers` restricts the table to the given symbols (case-insensitive).
    pub async fn portfolio_overview(
        &self,
        tickers: Option<&[String]>,
    ) -> Result<PortfolioOverview, CoreError> {
        let transactions = self.ledger.transactions().await?;
        let positions = self
            .holdings_service
            .positions_on(&transactions, NaiveDate::MAX);

        let holdings: BTreeMap<String, (f64, String)> = positions
            .into_iter()
            .filter(|p| match tickers {
                Some(filter) => filter.iter().any(|t| t.eq_ignore_ascii_case(&p.ticker)),
                None => true,
            })
            .map(|p| (p.ticker, (p.quantity, p.currency)))
            .collect();

        Ok(self
            .portfolio_service
            .overview(&self.price_service, &self.currency_service, &holdings)
            .await)
    }

    /// Allocation of the live portfolio by instrument type and ticker.
    pub async fn allocation(&self) -> Result<Vec<AllocationSlice>, CoreError> {
        let overview = self.portfolio_overview(None).await?;
        Ok(self.portfolio_service.allocation(&overview))
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Deposits and withdrawals with their running total.
    pub async fn cash_flow(&self) -> Result<Vec<CashFlowPoint>, CoreError> {
        let records = self.ledger.cashflows().await?;
        Ok(self.cashflow_service.cash_flow_series(&records))
    }

    /// Dividends per ticker plus portfolio totals.
    pub async fn dividend_breakdown(&self) -> Result<DividendBreakdown, CoreError> {
        let records = self.ledger.cashflows().await?;
        Ok(self.cashflow_service.dividend_breakdown(&records))
    }

    /// Value, wv, benchmark and deposit series from the snapshot table.
    pub async fn performance(&self) -> Result<PerformanceSeries, CoreError> {
        let snapshots = self.snapshots.snapshots().await?;
        let cash_flow = self.cash_flow().await?;
        Ok(self.performance_service.series(&snapshots, &cash_flow))
    }

    /// [`PortfolioTracker::performance`] with every series rebased to 100.
    pub async fn indexed_performance(&self) -> Result<PerformanceSeries, CoreError> {
        let series = self.performance().await?;
        Ok(self.performance_service.indexed(&series))
    }

    // ── Record Entry ────────────────────────────────────────────────

    /// Validate and append a buy/sell row. Returns the row as stored.
    pub async fn add_transaction(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        let transaction = self.ledger_service.prepare_transaction(transaction)?;
        self.ledger.append_transaction(&transaction).await?;
        info!(
            ticker = %transaction.ticker,
            kind = %transaction.transaction_type,
            date = %transaction.date,
            "transaction recorded"
        );
        Ok(transaction)
    }

    /// Validate and append a deposit/dividend row. Returns the row as stored.
    pub async fn add_cashflow(&self, record: CashflowRecord) -> Result<CashflowRecord, CoreError> {
        let record = self.ledger_service.prepare_cashflow(record)?;
        self.ledger.append_cashflow(&record).await?;
        info!(kind = %record.cashflow_type, date = %record.date, amount = record.amount, "cashflow recorded");
        Ok(record)
    }

    // ── Price Cache ─────────────────────────────────────────────────

    /// Total number of cached historical closes.
    #[must_use]
    pub fn cache_total_entries(&self) -> usize {
        self.price_cache.total_entries()
    }

    /// Get a cached close for a specific (symbol, currency, date).
    #[must_use]
    pub fn get_cached_price(&self, symbol: &str, currency: &str, date: NaiveDate) -> Option<f64> {
        self.price_cache.get_price(symbol, currency, date)
    }

    /// Seed the cache, e.g. with closes imported from elsewhere.
    pub fn set_cached_price(&mut self, symbol: &str, currency: &str, date: NaiveDate, price: f64) {
        self.price_cache.set_price(symbol, currency, date, price);
    }

    pub fn cache_clear(&mut self) {
        self.price_cache.clear();
    }

    /// Names of the providers serving an asset class, in fallback order.
    #[must_use]
    pub fn get_provider_names(&self, asset_class: models::asset::AssetClass) -> Vec<String> {
        self.price_service.get_provider_names(asset_class)
    }
}
