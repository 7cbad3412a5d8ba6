use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::traits::{LedgerStore, SnapshotStore};
use crate::errors::CoreError;
use crate::models::cashflow::CashflowRecord;
use crate::models::settings::DatastoreSettings;
use crate::models::snapshot::DailySnapshot;
use crate::models::transaction::Transaction;

const BACKEND: &str = "supabase";

/// Rows requested per page; PostgREST deployments cap responses at 1000 by default.
const PAGE_SIZE: usize = 1000;

/// Ledger rows share dates, so paging needs a unique tiebreaker.
/// `id` is the identity primary key Supabase adds to new tables.
const LEDGER_ORDER: &str = "date.asc,id.asc";

/// Snapshot dates are unique.
const SNAPSHOT_ORDER: &str = "date.asc";

/// Remote store speaking the PostgREST dialect exposed by Supabase.
///
/// Tables: transactions, deposits/dividends, and the daily snapshot table
/// (names from [`DatastoreSettings`]). The ledger tables need a unique `id`
/// column for stable paging and same-day ordering. The snapshot upsert relies
/// on a unique constraint on `date`.
pub struct SupabaseStore {
    client: Client,
    settings: DatastoreSettings,
}

impl SupabaseStore {
    pub fn new(settings: DatastoreSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, settings }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.settings.url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.settings.api_key)
            .bearer_auth(&self.settings.api_key)
    }

    async fn check(response: Response, action: &str) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CoreError::storage(
            BACKEND,
            format!("{action} failed with HTTP {status}: {body}"),
        ))
    }

    /// Fetch every row of a table, following offset pagination.
    async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        order: &str,
    ) -> Result<Vec<T>, CoreError> {
        let mut rows = Vec::new();
        let mut offset = 0usize;

        loop {
            let request = self
                .authorized(self.client.get(self.table_url(table)))
                .query(&page_query(order, offset));
            let response = request
                .send()
                .await
                .map_err(|e| CoreError::storage(BACKEND, format!("select from {table}: {}", CoreError::from(e))))?;
            let response = Self::check(response, &format!("select from {table}")).await?;
            let page: Vec<T> = response.json().await.map_err(|e| {
                CoreError::Deserialization(format!("Failed to decode rows of {table}: {e}"))
            })?;

            let fetched = page.len();
            rows.extend(page);
            debug!(table, fetched, total = rows.len(), "fetched page");
            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(rows)
    }

    async fn insert<T: Serialize + ?Sized + Sync>(
        &self,
        table: &str,
        body: &T,
        upsert_on: Option<&str>,
    ) -> Result<(), CoreError> {
        let mut request = self.authorized(self.client.post(self.table_url(table))).json(body);
        request = match upsert_on {
            Some(column) => request
                .query(&[("on_conflict", column)])
                .header("Prefer", "resolution=merge-duplicates,return=minimal"),
            None => request.header("Prefer", "return=minimal"),
        };

        let action = if upsert_on.is_some() { "upsert into" } else { "insert into" };
        let response = request
            .send()
            .await
            .map_err(|e| CoreError::storage(BACKEND, format!("{action} {table}: {}", CoreError::from(e))))?;
        Self::check(response, &format!("{action} {table}")).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SupabaseStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.select_all(&self.settings.transactions_table, LEDGER_ORDER).await
    }

    async fn cashflows(&self) -> Result<Vec<CashflowRecord>, CoreError> {
        self.select_all(&self.settings.cashflows_table, LEDGER_ORDER).await
    }

    async fn append_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        self.insert(&self.settings.transactions_table, transaction, None).await
    }

    async fn append_cashflow(&self, record: &CashflowRecord) -> Result<(), CoreError> {
        self.insert(&self.settings.cashflows_table, record, None).await
    }
}

#[async_trait]
impl SnapshotStore for SupabaseStore {
    fn backend_name(&self) -> &str {
        BACKEND
    }

    async fn snapshots(&self) -> Result<Vec<DailySnapshot>, CoreError> {
        self.select_all(&self.settings.snapshots_table, SNAPSHOT_ORDER).await
    }

    async fn upsert_snapshots(&self, rows: &[DailySnapshot]) -> Result<(), CoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.insert(&self.settings.snapshots_table, rows, Some("date")).await
    }
}

/// Query parameters for one page of a `select *`.
fn page_query(order: &str, offset: usize) -> [(&'static str, String); 4] {
    [
        ("select", "*".to_string()),
        ("order", order.to_string()),
        ("limit", PAGE_SIZE.to_string()),
        ("offset", offset.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_pages_break_date_ties_by_id() {
        let query = page_query(LEDGER_ORDER, 2000);
        assert_eq!(query[1], ("order", "date.asc,id.asc".to_string()));
        assert_eq!(query[2], ("limit", "1000".to_string()));
        assert_eq!(query[3], ("offset", "2000".to_string()));
    }

    #[test]
    fn snapshot_pages_order_by_date() {
        assert_eq!(page_query(SNAPSHOT_ORDER, 0)[1].1, "date.asc");
    }
}
