use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::cashflow::CashflowRecord;
use crate::models::snapshot::DailySnapshot;
use crate::models::transaction::Transaction;

/// Read access to the two append-only ledgers, plus single-row appends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Backend name used in errors and logs.
    fn backend_name(&self) -> &str;

    /// Every transaction row, in ledger order.
    async fn transactions(&self) -> Result<Vec<Transaction>, CoreError>;

    /// Every deposit/withdrawal/dividend row, in ledger order.
    async fn cashflows(&self) -> Result<Vec<CashflowRecord>, CoreError>;

    async fn append_transaction(&self, transaction: &Transaction) -> Result<(), CoreError>;

    async fn append_cashflow(&self, record: &CashflowRecord) -> Result<(), CoreError>;
}

/// The persisted daily net-worth table.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    fn backend_name(&self) -> &str;

    /// All persisted snapshots (any order).
    async fn snapshots(&self) -> Result<Vec<DailySnapshot>, CoreError>;

    /// Write a batch keyed by date. Rows whose date already exists are
    /// overwritten rather than duplicated or rejected.
    async fn upsert_snapshots(&self, rows: &[DailySnapshot]) -> Result<(), CoreError>;
}
