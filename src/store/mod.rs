pub mod client;
pub mod sqlite;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lifecycle of a report. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Processing,
    Completed,
    Error,
}

impl ReportStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReportStatus::Processing)
    }
}

/// The persisted document tracking one analysis request.
///
/// While `Processing`, both `report` and `error` are null. A terminal
/// update sets exactly one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub user_id: String,
    pub file_name: String,
    pub status: ReportStatus,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub report: Option<String>,
    pub error: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub content_sha256: String,
    pub content_bytes: u64,
}

impl ReportRecord {
    /// A fresh record for an upload that is about to be analyzed.
    /// Only a digest of the content is kept, never the content itself.
    pub fn processing(user_id: &str, file_name: &str, content: &str) -> Self {
        let now = Timestamp::now();
        Self {
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            status: ReportStatus::Processing,
            created_at: now,
            last_updated: now,
            report: None,
            error: None,
            model: None,
            content_sha256: format!("{:x}", Sha256::digest(content.as_bytes())),
            content_bytes: content.len() as u64,
        }
    }
}

/// A record together with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    #[serde(flatten)]
    pub record: ReportRecord,
}

/// A terminal update, merged field-by-field into the stored document.
///
/// `report` and `error` are always written (as null when absent) so the
/// one-of invariant holds after the merge. `model` is only written when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub status: ReportStatus,
    pub report: Option<String>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub last_updated: Timestamp,
}

impl RecordPatch {
    pub fn completed(report: String, model: Option<String>) -> Self {
        Self {
            status: ReportStatus::Completed,
            report: Some(report),
            error: None,
            model,
            last_updated: Timestamp::now(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: ReportStatus::Error,
            report: None,
            error: Some(error),
            model: None,
            last_updated: Timestamp::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or was never configured.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("document store connection lock poisoned")]
    Poisoned,
}

/// Where report records are kept.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new record and return its generated identifier.
    async fn insert(&self, record: &ReportRecord) -> Result<String, StoreError>;

    /// Merge `patch` into the record with `id`. Returns the number of records
    /// that matched; zero is not an error.
    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<u64, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError>;
}
