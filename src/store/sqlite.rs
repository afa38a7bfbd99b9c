use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::sync::Mutex;

use super::{RecordPatch, Report, ReportRecord, ReportStore, StoreError};
use crate::consts::REPORTS_COLLECTION;

/// SQLite-backed document store. Each document is a JSON object keyed by
/// `(collection, id)`; updates merge top-level fields.
#[derive(Debug)]
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteReportStore {
    /// Open or create the document table at `path`.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                timestamp  TEXT NOT NULL DEFAULT (datetime('now')),
                doc        TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: REPORTS_COLLECTION.to_string(),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    /// Identifiers in this collection, oldest first.
    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM documents WHERE collection = ?1 ORDER BY timestamp ASC, rowid ASC",
        )?;
        let ids = stmt
            .query_map([&self.collection], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Overlay every top-level field of `patch` onto `doc`.
fn merge(doc: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(fields)) = (doc, patch) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn insert(&self, record: &ReportRecord) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let json = serde_json::to_string(record)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, doc) VALUES (?1, ?2, ?3)",
            params![self.collection, id, json],
        )?;
        Ok(id)
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<u64, StoreError> {
        let patch = serde_json::to_value(patch)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT doc FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(existing) = existing else {
            return Ok(0);
        };

        let mut doc: Value = serde_json::from_str(&existing)?;
        merge(&mut doc, patch);

        let changed = tx.execute(
            "UPDATE documents SET doc = ?1 WHERE collection = ?2 AND id = ?3",
            params![doc.to_string(), self.collection, id],
        )?;
        tx.commit()?;
        Ok(changed as u64)
    }

    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT doc FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(Report {
                id: id.to_string(),
                record: serde_json::from_str(&json)?,
            })),
            None => Ok(None),
        }
    }
}
