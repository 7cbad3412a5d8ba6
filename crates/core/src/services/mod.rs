pub mod cashflow_service;
pub mod currency_service;
pub mod history_service;
pub mod holdings_service;
pub mod ledger_service;
pub mod performance_service;
pub mod portfolio_service;
pub mod price_service;
pub mod valuation_service;

/// Round a money amount to cents (half away from zero).
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
