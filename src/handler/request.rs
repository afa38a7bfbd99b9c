use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A validated upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub file_content: String,
    pub file_name: String,
}

impl ReportRequest {
    /// Check the shape of `{fileContent, fileName}`. Content must be a
    /// non-blank string; the name must be a string.
    pub fn from_payload(payload: &Value) -> Result<Self, Error> {
        let file_content = match payload.get("fileContent") {
            Some(Value::String(content)) if !content.trim().is_empty() => content.clone(),
            _ => {
                return Err(Error::invalid_argument(
                    "fileContent must be a non-empty string",
                ));
            }
        };
        let file_name = match payload.get("fileName") {
            Some(Value::String(name)) => name.clone(),
            _ => return Err(Error::invalid_argument("fileName must be a string")),
        };
        Ok(Self {
            file_content,
            file_name,
        })
    }
}

/// What a successful call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportResponse {
    pub status: String,
    pub report_id: String,
    pub report: String,
    pub file_name: String,
    pub created_at: Timestamp,
}

impl GenerateReportResponse {
    pub fn success(
        report_id: String,
        report: String,
        file_name: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            status: "success".to_string(),
            report_id,
            report,
            file_name,
            created_at,
        }
    }
}
