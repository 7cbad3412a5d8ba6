use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::cashflow_service::CashflowService;
use super::currency_service::CurrencyService;
use super::holdings_service::HoldingsService;
use super::price_service::PriceService;
use super::round_cents;
use super::valuation_service::ValuationService;
use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::models::price::{Fetch, PriceCache};
use crate::models::settings::BenchmarkSettings;
use crate::models::snapshot::{latest_snapshot_date, DailySnapshot};
use crate::models::valuation::{BackfillReport, MissingBenchmark, SkippedTicker};
use crate::storage::traits::{LedgerStore, SnapshotStore};

/// `true` for Monday through Friday. Market holidays are not excluded.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days in `[from, to]`, ascending. Empty when `from > to`.
pub fn business_days(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// Business days that still need a snapshot, from the day after `latest`
/// (or `earliest_ledger` when the table is empty) through yesterday.
pub fn missing_business_days(
    latest: Option<NaiveDate>,
    earliest_ledger: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let start = match (latest, earliest_ledger) {
        (Some(latest), _) => latest + Duration::days(1),
        (None, Some(earliest)) => earliest,
        (None, None) => return Vec::new(),
    };
    business_days(start, today - Duration::days(1))
}

/// Services and stores one backfill run works against.
pub struct BackfillContext<'a> {
    pub price_service: &'a PriceService,
    pub currency_service: &'a CurrencyService,
    pub ledger: &'a dyn LedgerStore,
    pub snapshots: &'a dyn SnapshotStore,
}

/// Builds the daily net-worth series one missing business day at a time.
pub struct HistoryService {
    benchmarks: BenchmarkSettings,
    holdings: HoldingsService,
    cashflows: CashflowService,
    valuation: ValuationService,
}

impl HistoryService {
    pub fn new(benchmarks: BenchmarkSettings) -> Self {
        Self {
            benchmarks,
            holdings: HoldingsService::new(),
            cashflows: CashflowService::new(),
            valuation: ValuationService::new(),
        }
    }

    /// Append a snapshot for every business day after the latest stored one
    /// up to (not including) `today`.
    ///
    /// Rows are collected in date order and written in one upsert keyed by
    /// date, so re-running over the same range overwrites instead of
    /// duplicating. Fetch failures end up in the report; only store errors
    /// are returned as `Err`.
    pub async fn backfill(
        &self,
        ctx: BackfillContext<'_>,
        cache: &mut PriceCache,
        today: NaiveDate,
    ) -> Result<BackfillReport, CoreError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("backfill", %run_id);
        self.run(ctx, cache, today, run_id).instrument(span).await
    }

    async fn run(
        &self,
        ctx: BackfillContext<'_>,
        cache: &mut PriceCache,
        today: NaiveDate,
        run_id: Uuid,
    ) -> Result<BackfillReport, CoreError> {
        let mut existing = ctx.snapshots.snapshots().await?;
        existing.sort_by_key(|s| s.date);
        let latest = latest_snapshot_date(&existing);

        let mut report = BackfillReport {
            run_id,
            new_rows: Vec::new(),
            skipped_tickers: Vec::new(),
            missing_benchmarks: Vec::new(),
            snapshots: Vec::new(),
        };

        // A table already through yesterday needs no ledger reads.
        if latest.is_some_and(|d| d >= today - Duration::days(1)) {
            info!(latest = ?latest, "snapshot table is up to date");
            report.snapshots = existing;
            return Ok(report);
        }

        let transactions = ctx.ledger.transactions().await?;
        let cashflows = ctx.ledger.cashflows().await?;
        let earliest_ledger = self
            .holdings
            .earliest_date(&transactions)
            .into_iter()
            .chain(self.cashflows.earliest_date(&cashflows))
            .min();

        let days = missing_business_days(latest, earliest_ledger, today);
        if days.is_empty() {
            info!(latest = ?latest, "no missing business days, nothing to backfill");
            report.snapshots = existing;
            return Ok(report);
        }
        info!(
            from = %days[0],
            to = %days[days.len() - 1],
            days = days.len(),
            "backfilling snapshots"
        );

        for date in days {
            let positions = self.holdings.positions_on(&transactions, date);
            let valuation = self
                .valuation
                .value_on(ctx.price_service, ctx.currency_service, cache, &positions, date)
                .await;
            for skipped in valuation.skipped() {
                report.skipped_tickers.push(SkippedTicker {
                    date,
                    ticker: skipped.ticker.clone(),
                    reason: skipped.skip_reason().unwrap_or_default(),
                });
            }

            let net_deposits = self.cashflows.net_deposits_up_to(&cashflows, date);
            let aex = self
                .benchmark_close(ctx.price_service, ctx.currency_service, cache, &self.benchmarks.aex, date, &mut report)
                .await;
            let sp = self
                .benchmark_close(ctx.price_service, ctx.currency_service, cache, &self.benchmarks.sp, date, &mut report)
                .await;

            let row = DailySnapshot {
                date,
                value: valuation.total,
                wv: round_cents(valuation.total - net_deposits),
                aex,
                sp,
            };
            debug!(%date, value = row.value, wv = row.wv, positions = positions.len(), "day valued");
            report.new_rows.push(row);
        }

        ctx.snapshots.upsert_snapshots(&report.new_rows).await?;

        let mut snapshots = ctx.snapshots.snapshots().await?;
        snapshots.sort_by_key(|s| s.date);
        report.snapshots = snapshots;

        info!(
            new_rows = report.new_rows.len(),
            skipped_tickers = report.skipped_tickers.len(),
            missing_benchmarks = report.missing_benchmarks.len(),
            "backfill complete"
        );
        Ok(report)
    }

    async fn benchmark_close(
        &self,
        price_service: &PriceService,
        currency_service: &CurrencyService,
        cache: &mut PriceCache,
        symbol: &str,
        date: NaiveDate,
        report: &mut BackfillReport,
    ) -> Option<f64> {
        match price_service
            .historical_close(cache, symbol, currency_service.home_currency(), AssetClass::Security, date)
            .await
        {
            Fetch::Available(close) => Some(close),
            Fetch::Unavailable { reason } => {
                warn!(symbol, %date, %reason, "benchmark close missing");
                report.missing_benchmarks.push(MissingBenchmark {
                    date,
                    symbol: symbol.to_string(),
                    reason,
                });
                None
            }
        }
    }
}
