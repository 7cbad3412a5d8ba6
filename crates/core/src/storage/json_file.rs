use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::merge_snapshots;
use super::traits::{LedgerStore, SnapshotStore};
use crate::errors::CoreError;
use crate::models::cashflow::CashflowRecord;
use crate::models::snapshot::DailySnapshot;
use crate::models::transaction::Transaction;

const BACKEND: &str = "json-file";

/// On-disk document holding both ledgers and the snapshot table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub cashflows: Vec<CashflowRecord>,
    #[serde(default)]
    pub snapshots: Vec<DailySnapshot>,
}

/// Local store backed by a single pretty-printed JSON file.
///
/// A missing file reads as an empty store; every write replaces the file
/// via a temporary sibling so a crash never leaves a half-written document.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document (empty if the file does not exist yet).
    pub fn load(&self) -> Result<StoreDocument, CoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let bytes = std::fs::read(&self.path)?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(StoreDocument::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Deserialization(format!(
                "Failed to parse store file {}: {e}",
                self.path.display()
            ))
        })
    }

    fn save(&self, document: &StoreDocument) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut StoreDocument),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CoreError::storage(BACKEND, "write lock poisoned"))?;
        let mut document = self.load()?;
        apply(&mut document);
        self.save(&document).map_err(|e| {
            CoreError::storage(BACKEND, format!("{}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.load()?.transactions)
    }

    async fn cashflows(&self) -> Result<Vec<CashflowRecord>, CoreError> {
        Ok(self.load()?.cashflows)
    }

    async fn append_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        self.update(|doc| doc.transactions.push(transaction.clone()))
    }

    async fn append_cashflow(&self, record: &CashflowRecord) -> Result<(), CoreError> {
        self.update(|doc| doc.cashflows.push(record.clone()))
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn snapshots(&self) -> Result<Vec<DailySnapshot>, CoreError> {
        Ok(self.load()?.snapshots)
    }

    async fn upsert_snapshots(&self, rows: &[DailySnapshot]) -> Result<(), CoreError> {
        self.update(|doc| {
            doc.snapshots.sort_by_key(|s| s.date);
            merge_snapshots(&mut doc.snapshots, rows);
        })
    }
}
