use crate::errors::CoreError;
use crate::models::asset::{is_valid_currency, normalize_currency};
use crate::models::cashflow::CashflowRecord;
use crate::models::transaction::Transaction;

/// Validates records before they are appended to a ledger.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Check a transaction and return it normalised for storage.
    ///
    /// Ticker and currency are trimmed (currency uppercased); a zero
    /// `total_value` is filled in as amount × price.
    pub fn prepare_transaction(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        let mut tx = transaction;
        tx.ticker = tx.ticker.trim().to_string();

        if tx.ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        if !tx.amount.is_finite() || tx.amount <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Amount must be positive, got {}",
                tx.amount
            )));
        }
        if !tx.price.is_finite() || tx.price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Price must be non-negative, got {}",
                tx.price
            )));
        }
        if !tx.fx_rate.is_finite() || tx.fx_rate <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "FX rate must be positive, got {}",
                tx.fx_rate
            )));
        }
        if !tx.fee.is_finite() || tx.fee < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Fee must be non-negative, got {}",
                tx.fee
            )));
        }
        tx.currency = Self::checked_currency(&tx.currency)?;

        if !tx.total_value.is_finite() {
            return Err(CoreError::ValidationError("Total value must be finite".into()));
        }
        if tx.total_value == 0.0 {
            tx.total_value = tx.amount * tx.price;
        }
        Ok(tx)
    }

    /// Check a deposit/dividend record and return it with its sign normalised.
    pub fn prepare_cashflow(&self, record: CashflowRecord) -> Result<CashflowRecord, CoreError> {
        if !record.amount.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "Amount must be finite, got {}",
                record.amount
            )));
        }
        let ticker = record
            .ticker
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if record.cashflow_type.is_dividend() && ticker.is_none() {
            return Err(CoreError::ValidationError(format!(
                "{} requires a ticker",
                record.cashflow_type
            )));
        }
        let currency = Self::checked_currency(&record.currency)?;

        Ok(CashflowRecord::new(
            record.date,
            ticker,
            record.amount,
            record.cashflow_type,
            currency,
        ))
    }

    fn checked_currency(code: &str) -> Result<String, CoreError> {
        if !is_valid_currency(code) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency '{code}': must be exactly 3 ASCII letters (e.g., EUR, USD)"
            )));
        }
        Ok(normalize_currency(code))
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
