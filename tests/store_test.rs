use sift::store::sqlite::SqliteReportStore;
use sift::store::{RecordPatch, ReportRecord, ReportStatus, ReportStore};

#[tokio::test]
async fn insert_and_get() {
    let store = SqliteReportStore::in_memory().unwrap();
    let record = ReportRecord::processing("u1", "sales.csv", "a,b\n1,2\n");

    let id = store.insert(&record).await.unwrap();
    let report = store.get(&id).await.unwrap().unwrap();

    assert_eq!(report.id, id);
    assert_eq!(report.record, record);
}

#[tokio::test]
async fn get_missing_is_none() {
    let store = SqliteReportStore::in_memory().unwrap();
    assert!(store.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn completed_update_merges_fields() {
    let store = SqliteReportStore::in_memory().unwrap();
    let record = ReportRecord::processing("u1", "sales.csv", "a,b\n1,2\n");
    let id = store.insert(&record).await.unwrap();

    let matched = store
        .update(
            &id,
            &RecordPatch::completed("## Executive Summary".to_string(), Some("m".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(matched, 1);

    let stored = store.get(&id).await.unwrap().unwrap().record;
    assert_eq!(stored.status, ReportStatus::Completed);
    assert_eq!(stored.report.as_deref(), Some("## Executive Summary"));
    assert!(stored.error.is_none());
    assert_eq!(stored.model.as_deref(), Some("m"));
    // Untouched fields survive the merge.
    assert_eq!(stored.user_id, "u1");
    assert_eq!(stored.file_name, "sales.csv");
    assert_eq!(stored.created_at, record.created_at);
    assert_eq!(stored.content_sha256, record.content_sha256);
    assert!(stored.last_updated >= record.last_updated);
}

#[tokio::test]
async fn failed_update_sets_error_only() {
    let store = SqliteReportStore::in_memory().unwrap();
    let id = store
        .insert(&ReportRecord::processing("u1", "a.csv", "x"))
        .await
        .unwrap();

    store
        .update(&id, &RecordPatch::failed("boom".to_string()))
        .await
        .unwrap();

    let stored = store.get(&id).await.unwrap().unwrap().record;
    assert_eq!(stored.status, ReportStatus::Error);
    assert_eq!(stored.error.as_deref(), Some("boom"));
    assert!(stored.report.is_none());
    assert!(stored.model.is_none());
}

#[tokio::test]
async fn update_missing_matches_nothing() {
    let store = SqliteReportStore::in_memory().unwrap();
    let matched = store
        .update("ghost", &RecordPatch::failed("boom".to_string()))
        .await
        .unwrap();
    assert_eq!(matched, 0);
}

#[tokio::test]
async fn persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.db");
    let path_str = path.to_str().unwrap();

    let id = {
        let store = SqliteReportStore::open(path_str).unwrap();
        store
            .insert(&ReportRecord::processing("u1", "a.csv", "x"))
            .await
            .unwrap()
    };

    let store = SqliteReportStore::open(path_str).unwrap();
    let report = store.get(&id).await.unwrap().unwrap();
    assert_eq!(report.record.file_name, "a.csv");
}
