use serde::{Deserialize, Serialize};

/// Routing category for market-data lookups.
/// Determines which providers in the registry are asked for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Listed instruments: equities, ETFs, funds, benchmark indices.
    Security,
    /// Fiat exchange rates (the symbol is the base currency code).
    Currency,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Security => write!(f, "Security"),
            AssetClass::Currency => write!(f, "Currency"),
        }
    }
}

/// Instrument classification reported by the market-data provider for a live quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    Equity,
    Etf,
    Index,
    Currency,
    MutualFund,
    Other(String),
}

impl InstrumentType {
    /// Map a provider classification string (e.g. Yahoo's `"EQUITY"`, `"ETF"`).
    pub fn from_provider_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "EQUITY" => InstrumentType::Equity,
            "ETF" => InstrumentType::Etf,
            "INDEX" => InstrumentType::Index,
            "CURRENCY" => InstrumentType::Currency,
            "MUTUALFUND" => InstrumentType::MutualFund,
            other => InstrumentType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentType::Equity => write!(f, "EQUITY"),
            InstrumentType::Etf => write!(f, "ETF"),
            InstrumentType::Index => write!(f, "INDEX"),
            InstrumentType::Currency => write!(f, "CURRENCY"),
            InstrumentType::MutualFund => write!(f, "MUTUALFUND"),
            InstrumentType::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Normalise a currency code: trimmed, uppercased.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A currency code is exactly three ASCII letters.
pub fn is_valid_currency(code: &str) -> bool {
    let trimmed = code.trim();
    trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic())
}
