use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::merge_snapshots;
use super::traits::{LedgerStore, SnapshotStore};
use crate::errors::CoreError;
use crate::models::cashflow::CashflowRecord;
use crate::models::snapshot::DailySnapshot;
use crate::models::transaction::Transaction;

const BACKEND: &str = "memory";

/// Process-local ledgers and snapshot table. Used in tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    cashflows: Mutex<Vec<CashflowRecord>>,
    snapshots: Mutex<Vec<DailySnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows.
    pub fn with_data(
        transactions: Vec<Transaction>,
        cashflows: Vec<CashflowRecord>,
        mut snapshots: Vec<DailySnapshot>,
    ) -> Self {
        snapshots.sort_by_key(|s| s.date);
        Self {
            transactions: Mutex::new(transactions),
            cashflows: Mutex::new(cashflows),
            snapshots: Mutex::new(snapshots),
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CoreError> {
        mutex
            .lock()
            .map_err(|_| CoreError::storage(BACKEND, "store lock poisoned"))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(Self::lock(&self.transactions)?.clone())
    }

    async fn cashflows(&self) -> Result<Vec<CashflowRecord>, CoreError> {
        Ok(Self::lock(&self.cashflows)?.clone())
    }

    async fn append_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        Self::lock(&self.transactions)?.push(transaction.clone());
        Ok(())
    }

    async fn append_cashflow(&self, record: &CashflowRecord) -> Result<(), CoreError> {
        Self::lock(&self.cashflows)?.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn snapshots(&self) -> Result<Vec<DailySnapshot>, CoreError> {
        Ok(Self::lock(&self.snapshots)?.clone())
    }

    async fn upsert_snapshots(&self, rows: &[DailySnapshot]) -> Result<(), CoreError> {
        let mut table = Self::lock(&self.snapshots)?;
        merge_snapshots(&mut table, rows);
        Ok(())
    }
}
