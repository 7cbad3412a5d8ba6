use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::round_cents;
use crate::models::cashflow::{CashflowRecord, CashflowType};
use crate::models::chart::{CashFlowPoint, DividendBreakdown, DividendSummary};

/// Aggregations over the deposits/dividends ledger.
pub struct CashflowService;

impl CashflowService {
    pub fn new() -> Self {
        Self
    }

    /// Net external money put into the portfolio up to `date` (inclusive):
    /// deposits minus withdrawals. Dividends are returns, not deposits.
    pub fn net_deposits_up_to(&self, records: &[CashflowRecord], date: NaiveDate) -> f64 {
        records
            .iter()
            .filter(|r| r.cashflow_type.is_external_flow() && r.date <= date)
            .map(|r| r.amount)
            .sum()
    }

    /// Deposits and withdrawals in date order with a running total.
    pub fn cash_flow_series(&self, records: &[CashflowRecord]) -> Vec<CashFlowPoint> {
        let mut flows: Vec<&CashflowRecord> = records
            .iter()
            .filter(|r| r.cashflow_type.is_external_flow())
            .collect();
        // Stable: same-date records keep ledger order.
        flows.sort_by_key(|r| r.date);

        let mut running = 0.0;
        flows
            .into_iter()
            .map(|r| {
                running += r.amount;
                CashFlowPoint {
                    date: r.date,
                    cashflow_type: r.cashflow_type,
                    amount: r.amount,
                    cumulative_total: round_cents(running),
                }
            })
            .collect()
    }

    /// Gross, tax and net dividends per paying ticker.
    ///
    /// Tax is reported as a negative amount whatever sign it was stored with.
    /// Dividend rows without a ticker are grouped under an empty ticker.
    pub fn dividend_breakdown(&self, records: &[CashflowRecord]) -> DividendBreakdown {
        let mut per_ticker: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for record in records.iter().filter(|r| r.cashflow_type.is_dividend()) {
            let ticker = record.ticker.clone().unwrap_or_default();
            let (gross, tax) = per_ticker.entry(ticker).or_insert((0.0, 0.0));
            match record.cashflow_type {
                CashflowType::DividendGross => *gross += record.amount,
                CashflowType::DividendTax => *tax -= record.amount.abs(),
                CashflowType::Deposit | CashflowType::Withdrawal => {}
            }
        }

        let by_ticker: Vec<DividendSummary> = per_ticker
            .into_iter()
            .map(|(ticker, (gross, tax))| DividendSummary {
                ticker,
                gross: round_cents(gross),
                tax: round_cents(tax),
                net: round_cents(gross + tax),
            })
            .collect();

        let total_net = round_cents(by_ticker.iter().map(|d| d.net).sum());
        let total_tax = round_cents(by_ticker.iter().map(|d| d.tax).sum());

        DividendBreakdown {
            by_ticker,
            total_net,
            total_tax,
        }
    }

    /// Date of the oldest cashflow record, if any.
    pub fn earliest_date(&self, records: &[CashflowRecord]) -> Option<NaiveDate> {
        records.iter().map(|r| r.date).min()
    }
}

impl Default for CashflowService {
    fn default() -> Self {
        Self::new()
    }
}
