// ═══════════════════════════════════════════════════════════════════
// Service Tests: HoldingsService, CashflowService, PriceService,
// CurrencyService, PortfolioService, PerformanceService, LedgerService
// ═══════════════════════════════════════════════════════════════════

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{date, registry_with, StubProvider};
use portfolio_history_core::errors::CoreError;
use portfolio_history_core::models::asset::{AssetClass, InstrumentType};
use portfolio_history_core::models::cashflow::{CashflowRecord, CashflowType};
use portfolio_history_core::models::price::{Fetch, PriceCache};
use portfolio_history_core::models::settings::Settings;
use portfolio_history_core::models::snapshot::DailySnapshot;
use portfolio_history_core::models::transaction::Transaction;
use portfolio_history_core::services::cashflow_service::CashflowService;
use portfolio_history_core::services::currency_service::CurrencyService;
use portfolio_history_core::services::holdings_service::HoldingsService;
use portfolio_history_core::services::ledger_service::LedgerService;
use portfolio_history_core::services::performance_service::PerformanceService;
use portfolio_history_core::services::price_service::PriceService;
use portfolio_history_core::storage::memory::MemoryStore;
use portfolio_history_core::storage::traits::LedgerStore;
use portfolio_history_core::PortfolioTracker;

fn ledger() -> Vec<Transaction> {
    vec![
        Transaction::buy(date(2024, 1, 2), "ASML.AS", 10.0, 600.0, "EUR"),
        Transaction::buy(date(2024, 1, 3), "AAPL", 5.0, 185.0, "USD"),
        Transaction::sell(date(2024, 1, 5), "ASML.AS", 4.0, 620.0, "EUR"),
        Transaction::buy(date(2024, 1, 8), "AAPL", 2.0, 180.0, "EUR"),
        Transaction::sell(date(2024, 1, 9), "AAPL", 7.0, 190.0, "USD"),
    ]
}

// ═══════════════════════════════════════════════════════════════════
// HoldingsService
// ═══════════════════════════════════════════════════════════════════

mod holdings {
    use super::*;

    #[test]
    fn nets_buys_against_sells() {
        let svc = HoldingsService::new();
        let holdings = svc.holdings_on(&ledger(), date(2024, 1, 5));
        assert_eq!(holdings.get("ASML.AS"), Some(&6.0));
        assert_eq!(holdings.get("AAPL"), Some(&5.0));
    }

    #[test]
    fn target_date_is_inclusive() {
        let svc = HoldingsService::new();
        assert!(svc.holdings_on(&ledger(), date(2024, 1, 1)).is_empty());
        assert_eq!(svc.holdings_on(&ledger(), date(2024, 1, 2)).len(), 1);
    }

    #[test]
    fn zero_positions_are_dropped() {
        let svc = HoldingsService::new();
        let holdings = svc.holdings_on(&ledger(), date(2024, 1, 9));
        assert!(!holdings.contains_key("AAPL"));
        assert_eq!(holdings.get("ASML.AS"), Some(&6.0));
    }

    #[test]
    fn each_day_differs_only_by_that_days_transactions() {
        let svc = HoldingsService::new();
        let tx = ledger();
        let mut day = date(2024, 1, 2);
        while day <= date(2024, 1, 10) {
            let before = svc.holdings_on(&tx, day.pred_opt().unwrap());
            let after = svc.holdings_on(&tx, day);
            for ticker in svc.tickers(&tx) {
                let delta: f64 = tx
                    .iter()
                    .filter(|t| t.date == day && t.ticker == ticker)
                    .map(Transaction::signed_amount)
                    .sum();
                let old = before.get(&ticker).copied().unwrap_or(0.0);
                let new = after.get(&ticker).copied().unwrap_or(0.0);
                assert!((new - old - delta).abs() < 1e-9, "{ticker} on {day}");
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn currency_follows_latest_transaction() {
        let svc = HoldingsService::new();
        let tx = ledger();
        assert_eq!(svc.currency_on(&tx, "AAPL", date(2024, 1, 7)), "USD");
        assert_eq!(svc.currency_on(&tx, "AAPL", date(2024, 1, 8)), "EUR");
        assert_eq!(svc.currency_on(&tx, "AAPL", date(2024, 1, 9)), "USD");
    }

    #[test]
    fn currency_defaults_to_eur() {
        let svc = HoldingsService::new();
        assert_eq!(svc.currency_on(&ledger(), "AAPL", date(2024, 1, 1)), "EUR");
        assert_eq!(svc.currency_on(&[], "ANY", date(2024, 1, 1)), "EUR");
    }

    #[test]
    fn same_day_ties_resolve_to_last_row() {
        let svc = HoldingsService::new();
        let tx = vec![
            Transaction::buy(date(2024, 1, 2), "SHEL", 1.0, 30.0, "GBP"),
            Transaction::buy(date(2024, 1, 2), "SHEL", 1.0, 35.0, "EUR"),
        ];
        assert_eq!(svc.currency_on(&tx, "SHEL", date(2024, 1, 2)), "EUR");
    }

    #[test]
    fn positions_carry_currency() {
        let svc = HoldingsService::new();
        let positions = svc.positions_on(&ledger(), date(2024, 1, 3));
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].ticker, "AAPL");
        assert_eq!(positions[0].currency, "USD");
        assert_eq!(positions[1].currency, "EUR");
    }

    #[test]
    fn earliest_date() {
        let svc = HoldingsService::new();
        assert_eq!(svc.earliest_date(&ledger()), Some(date(2024, 1, 2)));
        assert_eq!(svc.earliest_date(&[]), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// CashflowService
// ═══════════════════════════════════════════════════════════════════

mod cashflows {
    use super::*;

    fn records() -> Vec<CashflowRecord> {
        vec![
            CashflowRecord::deposit(date(2024, 1, 1), 1000.0, "EUR"),
            CashflowRecord::dividend_gross(date(2024, 2, 1), "ASML.AS", 20.0, "EUR"),
            CashflowRecord::dividend_tax(date(2024, 2, 1), "ASML.AS", 3.0, "EUR"),
            CashflowRecord::deposit(date(2024, 2, 15), 500.0, "EUR"),
            CashflowRecord::withdrawal(date(2024, 3, 1), 200.0, "EUR"),
            CashflowRecord::dividend_gross(date(2024, 3, 10), "AAPL", 4.5, "USD"),
        ]
    }

    #[test]
    fn net_deposits_ignore_dividends() {
        let svc = CashflowService::new();
        assert_eq!(svc.net_deposits_up_to(&records(), date(2024, 2, 1)), 1000.0);
        assert_eq!(svc.net_deposits_up_to(&records(), date(2024, 3, 1)), 1300.0);
        assert_eq!(svc.net_deposits_up_to(&records(), date(2023, 12, 31)), 0.0);
    }

    #[test]
    fn cash_flow_series_accumulates_in_date_order() {
        let svc = CashflowService::new();
        let mut shuffled = records();
        shuffled.reverse();
        let series = svc.cash_flow_series(&shuffled);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].cumulative_total, 1000.0);
        assert_eq!(series[1].cumulative_total, 1500.0);
        assert_eq!(series[2].cashflow_type, CashflowType::Withdrawal);
        assert_eq!(series[2].amount, -200.0);
        assert_eq!(series[2].cumulative_total, 1300.0);
    }

    #[test]
    fn dividend_breakdown_per_ticker() {
        let svc = CashflowService::new();
        let breakdown = svc.dividend_breakdown(&records());

        assert_eq!(breakdown.by_ticker.len(), 2);
        let asml = &breakdown.by_ticker[1];
        assert_eq!(asml.ticker, "ASML.AS");
        assert_eq!(asml.gross, 20.0);
        assert_eq!(asml.tax, -3.0);
        assert_eq!(asml.net, 17.0);
        assert_eq!(breakdown.total_net, 21.5);
        assert_eq!(breakdown.total_tax, -3.0);
    }

    #[test]
    fn tax_is_negative_whatever_the_stored_sign() {
        let svc = CashflowService::new();
        let mut tax = CashflowRecord::dividend_tax(date(2024, 2, 1), "X", 3.0, "EUR");
        tax.amount = 3.0;
        let breakdown = svc.dividend_breakdown(&[tax]);
        assert_eq!(breakdown.by_ticker[0].tax, -3.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// PriceService
// ═══════════════════════════════════════════════════════════════════

mod price_service {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_next_provider() {
        let primary = StubProvider::new("Primary", vec![AssetClass::Security]).failing("X");
        let backup =
            StubProvider::new("Backup", vec![AssetClass::Security]).close("X", "EUR", date(2024, 1, 2), 42.0);
        let svc = PriceService::new(registry_with(vec![primary, backup]), 0);
        let mut cache = PriceCache::new();

        let price = svc
            .historical_close(&mut cache, "X", "EUR", AssetClass::Security, date(2024, 1, 2))
            .await;
        assert_eq!(price, Fetch::Available(42.0));
    }

    #[tokio::test]
    async fn second_lookup_hits_cache() {
        let provider =
            StubProvider::new("Stub", vec![AssetClass::Security]).close("X", "EUR", date(2024, 1, 2), 42.0);
        let calls = provider.call_counter();
        let svc = PriceService::new(registry_with(vec![provider]), 0);
        let mut cache = PriceCache::new();

        for _ in 0..3 {
            svc.historical_close(&mut cache, "X", "EUR", AssetClass::Security, date(2024, 1, 2))
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let provider = StubProvider::new("Stub", vec![AssetClass::Security]);
        let calls = provider.call_counter();
        let svc = PriceService::new(registry_with(vec![provider]), 0);
        let mut cache = PriceCache::new();

        for _ in 0..2 {
            let price = svc
                .historical_close(&mut cache, "X", "EUR", AssetClass::Security, date(2024, 1, 2))
                .await;
            assert!(!price.is_available());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.total_entries(), 0);
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let provider =
            StubProvider::new("Stub", vec![AssetClass::Security]).close("X", "EUR", date(2024, 1, 2), -1.0);
        let svc = PriceService::new(registry_with(vec![provider]), 0);
        let mut cache = PriceCache::new();

        let price = svc
            .historical_close(&mut cache, "X", "EUR", AssetClass::Security, date(2024, 1, 2))
            .await;
        assert!(price.reason().unwrap().contains("non-negative"));
    }

    #[tokio::test]
    async fn no_provider_for_class() {
        let provider = StubProvider::new("Stub", vec![AssetClass::Security]);
        let svc = PriceService::new(registry_with(vec![provider]), 0);
        let mut cache = PriceCache::new();

        let rate = svc
            .historical_close(&mut cache, "USD", "EUR", AssetClass::Currency, date(2024, 1, 2))
            .await;
        assert!(rate.reason().unwrap().contains("No provider"));
        assert!(!svc.has_provider_for(AssetClass::Currency));
    }

    #[tokio::test]
    async fn live_only_providers_are_skipped_for_history() {
        let live = StubProvider::new("Live", vec![AssetClass::Currency])
            .live_only()
            .close("USD", "EUR", date(2024, 1, 2), 99.0);
        let hist = StubProvider::new("Hist", vec![AssetClass::Currency]).close("USD", "EUR", date(2024, 1, 2), 0.91);
        let svc = PriceService::new(registry_with(vec![live, hist]), 0);
        let mut cache = PriceCache::new();

        let rate = svc
            .historical_close(&mut cache, "USD", "EUR", AssetClass::Currency, date(2024, 1, 2))
            .await;
        assert_eq!(rate, Fetch::Available(0.91));
        assert_eq!(svc.get_provider_names(AssetClass::Currency), vec!["Live", "Hist"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyService
// ═══════════════════════════════════════════════════════════════════

mod currency_service {
    use super::*;

    #[tokio::test]
    async fn home_currency_short_circuits() {
        let provider = StubProvider::new("Stub", vec![AssetClass::Currency]);
        let calls = provider.call_counter();
        let prices = PriceService::new(registry_with(vec![provider]), 0);
        let svc = CurrencyService::new("eur");
        let mut cache = PriceCache::new();

        let rate = svc
            .historical_rate_to_home(&prices, &mut cache, "EUR", date(2024, 1, 2))
            .await;
        assert_eq!(rate, Fetch::Available(1.0));
        assert_eq!(svc.live_rate_to_home(&prices, " eur").await, Fetch::Available(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn historical_rate_comes_from_currency_providers() {
        let provider =
            StubProvider::new("Stub", vec![AssetClass::Currency]).close("USD", "EUR", date(2024, 1, 2), 0.91);
        let prices = PriceService::new(registry_with(vec![provider]), 0);
        let svc = CurrencyService::new("EUR");
        let mut cache = PriceCache::new();

        let rate = svc
            .historical_rate_to_home(&prices, &mut cache, "usd", date(2024, 1, 2))
            .await;
        assert_eq!(rate, Fetch::Available(0.91));
    }

    #[tokio::test]
    async fn live_rate_failure_is_unavailable() {
        let provider = StubProvider::new("Stub", vec![AssetClass::Currency]).failing("GBP");
        let prices = PriceService::new(registry_with(vec![provider]), 0);
        let svc = CurrencyService::new("EUR");

        assert!(!svc.live_rate_to_home(&prices, "GBP").await.is_available());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Live portfolio
// ═══════════════════════════════════════════════════════════════════

mod live_portfolio {
    use super::*;

    fn tracker(provider: StubProvider) -> PortfolioTracker {
        let store = Arc::new(MemoryStore::with_data(
            vec![
                Transaction::buy(date(2024, 1, 2), "ASML.AS", 2.0, 600.0, "EUR"),
                Transaction::buy(date(2024, 1, 3), "AAPL", 10.0, 185.0, "USD"),
                Transaction::buy(date(2024, 1, 3), "DEAD", 1.0, 1.0, "EUR"),
            ],
            Vec::new(),
            Vec::new(),
        ));
        PortfolioTracker::new(Settings::default(), store.clone(), store, registry_with(vec![provider])).unwrap()
    }

    fn market() -> StubProvider {
        StubProvider::new("Stub", vec![AssetClass::Security, AssetClass::Currency])
            .quote("ASML.AS", "EUR", 700.0, Some(690.0), InstrumentType::Equity)
            .quote("AAPL", "USD", 200.0, Some(190.0), InstrumentType::Equity)
            .quote("USD", "EUR", 0.9, None, InstrumentType::Currency)
            .failing("DEAD")
    }

    #[tokio::test]
    async fn positions_are_valued_and_sorted() {
        let overview = tracker(market()).portfolio_overview(None).await.unwrap();

        assert_eq!(overview.home_currency, "EUR");
        assert_eq!(overview.positions.len(), 3);
        assert_eq!(overview.positions[0].ticker, "AAPL");
        assert_eq!(overview.positions[0].value_home, 1800.0);
        assert_eq!(overview.positions[0].fx_to_home, Some(0.9));
        assert_eq!(overview.positions[1].ticker, "ASML.AS");
        assert_eq!(overview.positions[1].value_home, 1400.0);
        assert_eq!(overview.total_value, 3200.0);
    }

    #[tokio::test]
    async fn unpriced_position_is_listed_at_zero() {
        let overview = tracker(market()).portfolio_overview(None).await.unwrap();
        let dead = overview.positions.iter().find(|p| p.ticker == "DEAD").unwrap();
        assert_eq!(dead.value_home, 0.0);
        assert_eq!(dead.price, None);
        assert_eq!(dead.instrument_type, None);
    }

    #[tokio::test]
    async fn weighted_change_uses_position_values() {
        let overview = tracker(market()).portfolio_overview(None).await.unwrap();
        let aapl = (200.0 - 190.0) / 190.0 * 100.0;
        let asml = (700.0 - 690.0) / 690.0 * 100.0;
        let expected = (aapl * 1800.0 + asml * 1400.0) / 3200.0;
        assert!((overview.weighted_change_pct_1d - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ticker_filter() {
        let filter = vec!["asml.as".to_string()];
        let overview = tracker(market()).portfolio_overview(Some(filter.as_slice())).await.unwrap();
        assert_eq!(overview.positions.len(), 1);
        assert_eq!(overview.total_value, 1400.0);
    }

    #[tokio::test]
    async fn allocation_skips_unpriced_positions() {
        let slices = tracker(market()).allocation().await.unwrap();
        assert_eq!(slices.len(), 2);
        let total: f64 = slices.iter().map(|s| s.allocation_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(slices[0].ticker, "AAPL");
        assert!((slices[0].allocation_pct - 56.25).abs() < 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// PerformanceService
// ═══════════════════════════════════════════════════════════════════

mod performance {
    use super::*;

    fn snapshot(day: u32, value: f64, aex: Option<f64>) -> DailySnapshot {
        DailySnapshot {
            date: date(2024, 1, day),
            value,
            wv: value - 1000.0,
            aex,
            sp: Some(4700.0 + f64::from(day)),
        }
    }

    #[test]
    fn series_skip_missing_benchmarks() {
        let svc = PerformanceService::new();
        let snapshots = vec![
            snapshot(3, 1100.0, Some(810.0)),
            snapshot(2, 1000.0, None),
            snapshot(4, 1050.0, Some(820.0)),
        ];
        let series = svc.series(&snapshots, &[]);

        assert_eq!(series.value.len(), 3);
        assert_eq!(series.value[0].date, date(2024, 1, 2));
        assert_eq!(series.aex.len(), 2);
        assert_eq!(series.sp.len(), 3);
    }

    #[test]
    fn raw_deposits_keep_full_history() {
        let svc = PerformanceService::new();
        let flows = CashflowService::new().cash_flow_series(&[
            CashflowRecord::deposit(date(2023, 12, 1), 1000.0, "EUR"),
            CashflowRecord::deposit(date(2024, 1, 3), 500.0, "EUR"),
        ]);
        let series = svc.series(&[snapshot(2, 1000.0, None)], &flows);

        assert_eq!(series.deposits.len(), 2);
        assert_eq!(series.deposits[0].date, date(2023, 12, 1));
        assert_eq!(series.deposits[1].value, 1500.0);
    }

    #[test]
    fn indexed_deposits_start_at_first_snapshot() {
        let svc = PerformanceService::new();
        let flows = CashflowService::new().cash_flow_series(&[
            CashflowRecord::deposit(date(2023, 12, 1), 1000.0, "EUR"),
            CashflowRecord::deposit(date(2024, 1, 3), 500.0, "EUR"),
            CashflowRecord::deposit(date(2024, 1, 4), 1500.0, "EUR"),
        ]);
        let series = svc.series(&[snapshot(2, 1000.0, None), snapshot(4, 1100.0, None)], &flows);
        let indexed = svc.indexed(&series);

        let dates: Vec<_> = indexed.deposits.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 4)]);
        assert_eq!(indexed.deposits[0].value, 100.0);
        assert_eq!(indexed.deposits[1].value, 200.0);
    }

    #[test]
    fn indexed_series_start_at_100() {
        let svc = PerformanceService::new();
        let series = svc.series(
            &[snapshot(2, 1000.0, Some(800.0)), snapshot(3, 1100.0, Some(840.0))],
            &[],
        );
        let indexed = svc.indexed(&series);

        assert_eq!(indexed.value[0].value, 100.0);
        assert!((indexed.value[1].value - 110.0).abs() < 1e-9);
        assert!((indexed.aex[1].value - 105.0).abs() < 1e-9);
        // wv starts at zero, so it has no base to rebase on until it moves
        assert_eq!(indexed.wv.len(), 1);
    }

    #[test]
    fn empty_table_gives_empty_series() {
        let svc = PerformanceService::new();
        let series = svc.series(&[], &[]);
        assert!(series.value.is_empty());
        assert!(series.deposits.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// LedgerService / record entry
// ═══════════════════════════════════════════════════════════════════

mod record_entry {
    use super::*;

    fn valid() -> Transaction {
        Transaction::buy(date(2024, 1, 2), " ASML.AS ", 10.0, 600.0, "eur")
    }

    #[test]
    fn normalises_transaction() {
        let tx = LedgerService::new().prepare_transaction(valid()).unwrap();
        assert_eq!(tx.ticker, "ASML.AS");
        assert_eq!(tx.currency, "EUR");
        assert_eq!(tx.total_value, 6000.0);
    }

    #[test]
    fn fills_in_missing_total_value() {
        let mut tx = valid();
        tx.total_value = 0.0;
        let tx = LedgerService::new().prepare_transaction(tx).unwrap();
        assert_eq!(tx.total_value, 6000.0);
    }

    #[test]
    fn rejects_bad_transactions() {
        let svc = LedgerService::new();
        let cases: Vec<Box<dyn Fn(&mut Transaction)>> = vec![
            Box::new(|t: &mut Transaction| t.ticker = "  ".into()),
            Box::new(|t: &mut Transaction| t.amount = 0.0),
            Box::new(|t: &mut Transaction| t.amount = f64::NAN),
            Box::new(|t: &mut Transaction| t.price = -1.0),
            Box::new(|t: &mut Transaction| t.price = f64::INFINITY),
            Box::new(|t: &mut Transaction| t.currency = "EURO".into()),
            Box::new(|t: &mut Transaction| t.fx_rate = 0.0),
            Box::new(|t: &mut Transaction| t.fee = -0.5),
        ];
        for mutate in cases {
            let mut tx = valid();
            mutate(&mut tx);
            let err = svc.prepare_transaction(tx).unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)));
        }
    }

    #[test]
    fn cashflow_sign_is_normalised() {
        let svc = LedgerService::new();
        let mut withdrawal = CashflowRecord::withdrawal(date(2024, 1, 2), 100.0, "EUR");
        withdrawal.amount = 100.0;
        assert_eq!(svc.prepare_cashflow(withdrawal).unwrap().amount, -100.0);

        let mut deposit = CashflowRecord::deposit(date(2024, 1, 2), 100.0, "EUR");
        deposit.amount = -100.0;
        assert_eq!(svc.prepare_cashflow(deposit).unwrap().amount, 100.0);
    }

    #[test]
    fn dividend_requires_ticker() {
        let svc = LedgerService::new();
        let mut record = CashflowRecord::dividend_gross(date(2024, 1, 2), "X", 5.0, "EUR");
        record.ticker = Some(" ".into());
        assert!(svc.prepare_cashflow(record).is_err());
    }

    #[tokio::test]
    async fn tracker_appends_validated_rows() {
        let store = Arc::new(MemoryStore::new());
        let tracker = PortfolioTracker::new(
            Settings::default(),
            store.clone(),
            store.clone(),
            registry_with(Vec::new()),
        )
        .unwrap();

        tracker.add_transaction(valid()).await.unwrap();
        assert!(tracker.add_transaction(Transaction::buy(date(2024, 1, 2), "", 1.0, 1.0, "EUR")).await.is_err());
        tracker
            .add_cashflow(CashflowRecord::new(date(2024, 1, 2), None, -250.0, CashflowType::Deposit, "eur"))
            .await
            .unwrap();

        let transactions = store.transactions().await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].ticker, "ASML.AS");
        let cashflows = store.cashflows().await.unwrap();
        assert_eq!(cashflows[0].amount, 250.0);
        assert_eq!(cashflows[0].currency, "EUR");
    }
}
