//! Lazily connected handle to the document store.
//!
//! The first caller to need the store opens it; everyone after that shares
//! the same handle. Concurrent first use converges on one connection through
//! [`OnceCell`]. A failed connect leaves the cell empty, so the next request
//! tries again.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::sqlite::SqliteReportStore;
use super::{RecordPatch, Report, ReportRecord, ReportStore, StoreError};

const TRACING_TARGET: &str = "sift::store";

pub struct PersistenceClient {
    database_url: Option<String>,
    handle: OnceCell<Arc<SqliteReportStore>>,
}

impl PersistenceClient {
    pub fn new(database_url: Option<String>) -> Self {
        Self {
            database_url,
            handle: OnceCell::new(),
        }
    }

    /// Return the live handle, opening it on first use.
    pub async fn connect(&self) -> Result<Arc<SqliteReportStore>, StoreError> {
        self.handle
            .get_or_try_init(|| async {
                let url = self
                    .database_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or_else(|| {
                        StoreError::Unavailable(
                            "no document store connection string configured".to_string(),
                        )
                    })?;
                let store = SqliteReportStore::open(url).map_err(|e| {
                    tracing::error!(target: TRACING_TARGET, error = %e, "failed to connect to document store");
                    e
                })?;
                tracing::info!(target: TRACING_TARGET, "connected to document store");
                Ok::<_, StoreError>(Arc::new(store))
            })
            .await
            .cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }
}

#[async_trait]
impl ReportStore for PersistenceClient {
    async fn insert(&self, record: &ReportRecord) -> Result<String, StoreError> {
        self.connect().await?.insert(record).await
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<u64, StoreError> {
        self.connect().await?.update(id, patch).await
    }

    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        self.connect().await?.get(id).await
    }
}
