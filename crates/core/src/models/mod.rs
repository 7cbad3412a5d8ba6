pub mod asset;
pub mod cashflow;
pub mod chart;
pub mod portfolio;
pub mod price;
pub mod settings;
pub mod snapshot;
pub mod transaction;
pub mod valuation;

mod serde_helpers;
