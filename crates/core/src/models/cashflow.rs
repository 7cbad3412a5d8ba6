use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::serde_helpers::{blank_as_none, flexible_date};

/// Kind of cash movement recorded in the cashflow ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashflowType {
    Deposit,
    Withdrawal,
    #[serde(rename = "Dividend Gross")]
    DividendGross,
    #[serde(rename = "Dividend Tax")]
    DividendTax,
}

impl CashflowType {
    /// Deposits and withdrawals move money in or out of the portfolio;
    /// dividends are returns on it.
    pub fn is_external_flow(&self) -> bool {
        matches!(self, CashflowType::Deposit | CashflowType::Withdrawal)
    }

    pub fn is_dividend(&self) -> bool {
        matches!(self, CashflowType::DividendGross | CashflowType::DividendTax)
    }

    /// Sign the stored amount carries for this kind of record.
    pub fn sign(&self) -> f64 {
        match self {
            CashflowType::Deposit | CashflowType::DividendGross => 1.0,
            CashflowType::Withdrawal | CashflowType::DividendTax => -1.0,
        }
    }
}

impl std::fmt::Display for CashflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CashflowType::Deposit => write!(f, "Deposit"),
            CashflowType::Withdrawal => write!(f, "Withdrawal"),
            CashflowType::DividendGross => write!(f, "Dividend Gross"),
            CashflowType::DividendTax => write!(f, "Dividend Tax"),
        }
    }
}

/// A single row of the append-only deposits/dividends ledger.
///
/// `amount` is signed: positive for deposits and gross dividends,
/// negative for withdrawals and dividend tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRecord {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,

    /// Paying instrument for dividends; usually absent for deposits
    #[serde(default, deserialize_with = "blank_as_none")]
    pub ticker: Option<String>,

    pub amount: f64,

    #[serde(rename = "type")]
    pub cashflow_type: CashflowType,

    pub currency: String,
}

impl CashflowRecord {
    /// Build a record, forcing the sign of `amount` to match `cashflow_type`.
    pub fn new(
        date: NaiveDate,
        ticker: Option<String>,
        amount: f64,
        cashflow_type: CashflowType,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            date,
            ticker,
            amount: amount.abs() * cashflow_type.sign(),
            cashflow_type,
            currency: currency.into(),
        }
    }

    pub fn deposit(date: NaiveDate, amount: f64, currency: impl Into<String>) -> Self {
        Self::new(date, None, amount, CashflowType::Deposit, currency)
    }

    pub fn withdrawal(date: NaiveDate, amount: f64, currency: impl Into<String>) -> Self {
        Self::new(date, None, amount, CashflowType::Withdrawal, currency)
    }

    pub fn dividend_gross(
        date: NaiveDate,
        ticker: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(date, Some(ticker.into()), amount, CashflowType::DividendGross, currency)
    }

    pub fn dividend_tax(
        date: NaiveDate,
        ticker: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(date, Some(ticker.into()), amount, CashflowType::DividendTax, currency)
    }
}
