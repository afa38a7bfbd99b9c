use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerateError, Generation, Generator, TokenUsage};
use crate::consts::{DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

const API_VERSION: &str = "2023-06-01";
const TRACING_TARGET: &str = "sift::generator";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_url: String,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Calls the Anthropic Messages API. The HTTP client is built once and reused.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicGenerator {
    pub fn new(config: AnthropicConfig) -> Result<Self, GenerateError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerateError::Unavailable(
                "no Anthropic API key configured".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerateError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<Generation, GenerateError> {
        let messages = [Message {
            role: "user",
            content: user,
        }];
        let body = ApiRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: &messages,
        };

        let resp = self
            .client
            .post(&self.config.api_url)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerateError::Api { status, body });
        }

        let body = resp.bytes().await?;
        let api_resp: ApiResponse =
            serde_json::from_slice(&body).map_err(GenerateError::Malformed)?;
        let usage = api_resp.usage.as_ref().map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        });
        if let Some(usage) = usage {
            tracing::debug!(
                target: TRACING_TARGET,
                input = usage.input_tokens,
                output = usage.output_tokens,
                "token usage"
            );
        }

        let text = api_resp.text().ok_or(GenerateError::EmptyResponse)?;
        Ok(Generation {
            text,
            model: api_resp.model.unwrap_or_else(|| self.config.model.clone()),
            usage,
        })
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message<'a>],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Option<Usage>,
}

impl ApiResponse {
    /// Concatenated text blocks, or `None` when there is nothing usable.
    fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> ApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_joins_text_blocks() {
        let resp = decode(
            r###"{"content": [
                {"type": "text", "text": "## Executive Summary\n"},
                {"type": "text", "text": "Sales are up."}
            ]}"###,
        );
        assert_eq!(
            resp.text().unwrap(),
            "## Executive Summary\nSales are up."
        );
    }

    #[test]
    fn text_skips_non_text_blocks() {
        let resp = decode(
            r#"{"content": [
                {"type": "thinking", "text": "hidden"},
                {"type": "text", "text": "visible"}
            ]}"#,
        );
        assert_eq!(resp.text().unwrap(), "visible");
    }

    #[test]
    fn no_content_is_none() {
        assert!(decode(r#"{"content": []}"#).text().is_none());
        assert!(decode(r#"{}"#).text().is_none());
    }

    #[test]
    fn whitespace_only_text_is_none() {
        let resp = decode(r#"{"content": [{"type": "text", "text": "  \n "}]}"#);
        assert!(resp.text().is_none());
    }

    #[test]
    fn text_block_without_text_is_none() {
        let resp = decode(r#"{"content": [{"type": "text"}]}"#);
        assert!(resp.text().is_none());
    }

    #[test]
    fn block_without_type_is_not_text() {
        let resp = decode(r#"{"content": [{"text": "hi"}]}"#);
        assert!(resp.text().is_none());
    }

    #[test]
    fn partial_usage_still_decodes() {
        let resp = decode(
            r#"{"content": [{"type": "text", "text": "report"}], "usage": {"input_tokens": 3}}"#,
        );
        assert_eq!(resp.text().unwrap(), "report");
        let usage = resp.usage.unwrap();
        assert_eq!(usage.input_tokens, 3);
        assert_eq!(usage.output_tokens, 0);
    }

    #[test]
    fn request_body_shape() {
        let messages = [Message {
            role: "user",
            content: "a,b\n1,2",
        }];
        let body = ApiRequest {
            model: "m",
            max_tokens: 10,
            system: "persona",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "persona");
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "a,b\n1,2");
    }

    #[test]
    fn blank_api_key_is_unavailable() {
        let result = AnthropicGenerator::new(AnthropicConfig::new("  "));
        assert!(matches!(result, Err(GenerateError::Unavailable(_))));
    }

    #[test]
    fn config_defaults() {
        let config = AnthropicConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
