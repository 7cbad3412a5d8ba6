use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::serde_helpers::flexible_date;

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Acquiring shares
    #[serde(alias = "Buy", alias = "BUY")]
    Buy,
    /// Disposing of shares
    #[serde(alias = "Sell", alias = "SELL")]
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "buy"),
            TransactionType::Sell => write!(f, "sell"),
        }
    }
}

/// A single row of the append-only transaction ledger.
///
/// Field names follow the `transactions` table of the remote datastore,
/// so rows round-trip through the store without a mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Trade date (daily granularity)
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,

    /// Market symbol as understood by the price provider (e.g. "ASML.AS")
    pub ticker: String,

    /// Buy or sell
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Number of shares; the direction comes from `transaction_type`
    pub amount: f64,

    /// Price per share in `currency`
    pub price: f64,

    /// Currency the trade settled in
    pub currency: String,

    /// Rate to the home currency recorded at trade time
    #[serde(default = "default_fx_rate")]
    pub fx_rate: f64,

    #[serde(rename = "transaction_fee", default)]
    pub fee: f64,

    /// amount × price, in `currency`
    #[serde(default)]
    pub total_value: f64,
}

fn default_fx_rate() -> f64 {
    1.0
}

impl Transaction {
    /// Create a transaction with `fx_rate = 1.0`, no fee, and
    /// `total_value = amount × price`.
    pub fn new(
        date: NaiveDate,
        ticker: impl Into<String>,
        transaction_type: TransactionType,
        amount: f64,
        price: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            transaction_type,
            amount,
            price,
            currency: currency.into(),
            fx_rate: 1.0,
            fee: 0.0,
            total_value: amount * price,
        }
    }

    pub fn buy(
        date: NaiveDate,
        ticker: impl Into<String>,
        amount: f64,
        price: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(date, ticker, TransactionType::Buy, amount, price, currency)
    }

    pub fn sell(
        date: NaiveDate,
        ticker: impl Into<String>,
        amount: f64,
        price: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(date, ticker, TransactionType::Sell, amount, price, currency)
    }

    pub fn with_fx_rate(mut self, fx_rate: f64) -> Self {
        self.fx_rate = fx_rate;
        self
    }

    pub fn with_fee(mut self, fee: f64) -> Self {
        self.fee = fee;
        self
    }

    /// Share delta this row applies to holdings: +amount for buys, −amount for sells.
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Buy => self.amount,
            TransactionType::Sell => -self.amount,
        }
    }
}
