//! Request handling: validate, record, generate, settle.
//!
//! Every valid request leaves exactly one report record behind. It is
//! inserted as `processing` before generation starts and moved to
//! `completed` or `error` once generation settles.

mod request;

pub use request::{GenerateReportResponse, ReportRequest};

use serde_json::Value;
use std::sync::Arc;

use crate::error::Error;
use crate::generator::Generator;
use crate::prompts::analyst::build_user_message;
use crate::store::{RecordPatch, Report, ReportRecord, ReportStore};

const TRACING_TARGET: &str = "sift::handler";

/// Orchestrates one report per call. Cheap to clone.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    generator: Arc<dyn Generator>,
    persona: Arc<str>,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn ReportStore>,
        generator: Arc<dyn Generator>,
        persona: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            generator,
            persona: persona.into(),
        }
    }

    /// Analyze the uploaded file in `payload` on behalf of `caller`.
    ///
    /// The caller is checked before the payload, and the payload before
    /// anything is written or sent.
    pub async fn generate_report(
        &self,
        caller: Option<&str>,
        payload: &Value,
    ) -> Result<GenerateReportResponse, Error> {
        let user_id = authenticated(caller)?;
        let request = ReportRequest::from_payload(payload)?;

        let record = ReportRecord::processing(user_id, &request.file_name, &request.file_content);
        let created_at = record.created_at;
        let report_id = self.store.insert(&record).await.map_err(|e| {
            tracing::error!(target: TRACING_TARGET, error = %e, "failed to create report record");
            Error::from(e)
        })?;
        tracing::info!(
            target: TRACING_TARGET,
            report_id = %report_id,
            user_id = %user_id,
            file_name = %request.file_name,
            bytes = record.content_bytes,
            "report processing"
        );

        match self.complete(&report_id, &request).await {
            Ok(report) => {
                tracing::info!(target: TRACING_TARGET, report_id = %report_id, "report completed");
                Ok(GenerateReportResponse::success(
                    report_id,
                    report,
                    request.file_name,
                    created_at,
                ))
            }
            Err(err) => {
                tracing::error!(target: TRACING_TARGET, report_id = %report_id, error = %err, "report failed");
                self.record_failure(&report_id, &err).await;
                Err(err)
            }
        }
    }

    /// Fetch a report the caller owns. Reports owned by someone else are
    /// indistinguishable from missing ones.
    pub async fn get_report(&self, caller: Option<&str>, id: &str) -> Result<Report, Error> {
        let user_id = authenticated(caller)?;
        match self.store.get(id).await? {
            Some(report) if report.record.user_id == user_id => Ok(report),
            _ => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn complete(&self, report_id: &str, request: &ReportRequest) -> Result<String, Error> {
        let user = build_user_message(&request.file_name, &request.file_content);
        let generation = self.generator.generate(&self.persona, &user).await?;

        let patch = RecordPatch::completed(generation.text.clone(), Some(generation.model));
        let matched = self.store.update(report_id, &patch).await?;
        if matched == 0 {
            tracing::warn!(
                target: TRACING_TARGET,
                report_id = %report_id,
                "completed update matched no record"
            );
        }
        Ok(generation.text)
    }

    /// Best effort: a failure here is logged and the original error stands.
    async fn record_failure(&self, report_id: &str, err: &Error) {
        let patch = RecordPatch::failed(err.to_string());
        match self.store.update(report_id, &patch).await {
            Ok(0) => tracing::warn!(
                target: TRACING_TARGET,
                report_id = %report_id,
                "error update matched no record"
            ),
            Ok(_) => {}
            Err(e) => tracing::error!(
                target: TRACING_TARGET,
                report_id = %report_id,
                error = %e,
                "failed to record report error"
            ),
        }
    }
}

/// The verified caller identity, if one was supplied.
pub fn authenticated(caller: Option<&str>) -> Result<&str, Error> {
    caller
        .map(str::trim)
        .filter(|caller| !caller.is_empty())
        .ok_or(Error::Unauthenticated)
}
