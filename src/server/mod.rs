//! HTTP surface, shaped like a callable function.
//!
//! Requests wrap their arguments as `{"data": {...}}` and successful
//! responses come back as `{"result": {...}}`. Failures use
//! [`ErrorBody`](crate::error::ErrorBody). The caller identity arrives in
//! the [`CALLER_HEADER`] set by the fronting identity provider.

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::consts::{CALLER_HEADER, DEFAULT_MAX_UPLOAD_BYTES};
use crate::error::Error;
use crate::handler::{GenerateReportResponse, ReportService, authenticated};
use crate::store::Report;

const TRACING_TARGET: &str = "sift::server";

/// Success envelope for callable responses.
#[derive(Debug, Serialize)]
pub struct CallableResult<T> {
    pub result: T,
}

/// Limits enforced by the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Clone)]
struct AppState {
    service: ReportService,
    config: ServerConfig,
}

pub fn router(service: ReportService, config: ServerConfig) -> Router {
    Router::new()
        .route("/generateReport", post(generate_report))
        .route("/reports/{id}", get(get_report))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(AppState { service, config })
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(addr: &str, service: ReportService, config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        target: TRACING_TARGET,
        addr = %listener.local_addr()?,
        "listening"
    );
    axum::serve(listener, router(service, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: TRACING_TARGET, error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!(target: TRACING_TARGET, "shutting down");
}

fn caller(headers: &HeaderMap) -> Option<&str> {
    headers.get(CALLER_HEADER)?.to_str().ok()
}

/// Pull `data` out of the envelope. Anything unparseable becomes `null`
/// so the caller check still runs before payload validation.
fn callable_data(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|mut envelope| envelope.get_mut("data").map(Value::take))
        .unwrap_or(Value::Null)
}

/// The body is buffered here rather than by an extractor so an oversized
/// upload is still answered in the error envelope, after the caller check.
async fn generate_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<CallableResult<GenerateReportResponse>>, Error> {
    let caller = caller(&headers);
    let limit = state.config.max_upload_bytes;
    let data = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => callable_data(&bytes),
        Err(e) => {
            authenticated(caller)?;
            tracing::warn!(target: TRACING_TARGET, error = %e, limit, "rejected request body");
            return Err(Error::invalid_argument(format!(
                "request body exceeds the {limit} byte upload limit or could not be read"
            )));
        }
    };
    let result = state.service.generate_report(caller, &data).await?;
    Ok(Json(CallableResult { result }))
}

async fn get_report(
    State(AppState { service, .. }): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CallableResult<Report>>, Error> {
    let result = service.get_report(caller(&headers), &id).await?;
    Ok(Json(CallableResult { result }))
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn callable_data_unwraps_envelope() {
        let body = br#"{"data": {"fileContent": "a", "fileName": "b"}}"#;
        assert_eq!(
            callable_data(body),
            json!({"fileContent": "a", "fileName": "b"})
        );
    }

    #[test]
    fn callable_data_without_envelope_is_null() {
        assert_eq!(callable_data(br#"{"fileContent": "a"}"#), Value::Null);
        assert_eq!(callable_data(b"not json"), Value::Null);
        assert_eq!(callable_data(b""), Value::Null);
    }

    #[test]
    fn caller_reads_identity_header() {
        let mut headers = HeaderMap::new();
        assert!(caller(&headers).is_none());
        headers.insert(CALLER_HEADER, HeaderValue::from_static("uid-7"));
        assert_eq!(caller(&headers), Some("uid-7"));
    }
}
