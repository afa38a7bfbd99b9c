//! Process configuration, read from flags or the environment.
//!
//! Two settings are secrets and both are required: the document store
//! connection string and the generation API key. [`Settings::build_service`]
//! refuses to start without them.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::consts::{
    DEFAULT_API_URL, DEFAULT_BIND, DEFAULT_MAX_TOKENS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_DATABASE_URL,
};
use crate::generator::anthropic::{AnthropicConfig, AnthropicGenerator};
use crate::handler::ReportService;
use crate::server::ServerConfig;
use crate::prompts::analyst::load_persona;
use crate::store::client::PersistenceClient;

const TRACING_TARGET: &str = "sift::config";

// Every flag is global so it is accepted before or after a subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
    /// Document store connection string (SQLite path, or :memory:)
    #[arg(long, global = true, env = ENV_DATABASE_URL, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Anthropic API key
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used to write reports
    #[arg(long, global = true, env = "SIFT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum tokens per generated report
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Messages API endpoint
    #[arg(long, global = true, env = "SIFT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// File holding the analyst persona prompt (defaults to the built-in one)
    #[arg(long, global = true, env = "SIFT_PERSONA_FILE")]
    pub persona_file: Option<PathBuf>,

    /// Generation request timeout in seconds
    #[arg(short, long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Address the HTTP server listens on
    #[arg(short, long, global = true, env = "SIFT_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Largest accepted request body in bytes
    #[arg(long, global = true, env = "SIFT_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

fn required<'a>(value: &'a Option<String>, name: &str, env: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => bail!("{name} is not configured (set --{} or {env})", name.replace(' ', "-")),
    }
}

impl Settings {
    /// Fail unless both secrets are present and the numbers are sane.
    pub fn validate(&self) -> Result<()> {
        required(&self.database_url, "database url", ENV_DATABASE_URL)?;
        required(&self.api_key, "api key", ENV_API_KEY)?;
        if self.max_tokens == 0 {
            bail!("max tokens must be positive");
        }
        if self.timeout == 0 {
            bail!("timeout must be positive");
        }
        if self.max_upload_bytes == 0 {
            bail!("max upload bytes must be positive");
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn anthropic_config(&self) -> Result<AnthropicConfig> {
        let api_key = required(&self.api_key, "api key", ENV_API_KEY)?;
        Ok(AnthropicConfig {
            api_key: api_key.to_string(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// Wire up the request handler. The store connects lazily on first use.
    pub fn build_service(&self) -> Result<ReportService> {
        self.validate()?;

        let persona = load_persona(self.persona_file.as_deref())?;
        let generator = AnthropicGenerator::new(self.anthropic_config()?)
            .context("failed to initialize generation client")?;
        let store = PersistenceClient::new(self.database_url.clone());

        tracing::info!(
            target: TRACING_TARGET,
            model = %self.model,
            persona = %self
                .persona_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            "service configured"
        );

        Ok(ReportService::new(
            Arc::new(store),
            Arc::new(generator),
            persona,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    fn settings() -> Settings {
        Settings {
            database_url: Some(":memory:".to_string()),
            api_key: Some("sk-test".to_string()),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: DEFAULT_API_URL.to_string(),
            persona_file: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    #[test]
    fn complete_settings_validate() {
        settings().validate().unwrap();
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let settings = Settings {
            database_url: None,
            ..settings()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("database url"));
        assert!(err.to_string().contains(ENV_DATABASE_URL));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let settings = Settings {
            api_key: Some("   ".to_string()),
            ..settings()
        };
        let err = settings.build_service().err().unwrap();
        assert!(err.to_string().contains("api key"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let settings = Settings {
            timeout: 0,
            ..settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn anthropic_config_carries_settings() {
        let settings = Settings {
            model: "claude-test".to_string(),
            timeout: 5,
            ..settings()
        };
        let config = settings.anthropic_config().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_persona_file_is_fatal() {
        let settings = Settings {
            persona_file: Some(PathBuf::from("/nonexistent/persona.md")),
            ..settings()
        };
        assert!(settings.build_service().is_err());
    }

    #[test]
    fn build_service_with_valid_settings() {
        assert!(settings().build_service().is_ok());
    }

    #[test]
    fn parses_flags() {
        let cli = TestCli::try_parse_from([
            "sift",
            "--database-url",
            "reports.db",
            "--api-key",
            "sk-flag",
            "--max-tokens",
            "1024",
        ])
        .unwrap();
        assert_eq!(cli.settings.database_url.as_deref(), Some("reports.db"));
        assert_eq!(cli.settings.api_key.as_deref(), Some("sk-flag"));
        assert_eq!(cli.settings.max_tokens, 1024);
        assert_eq!(cli.settings.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn parses_server_flags() {
        let cli = TestCli::try_parse_from([
            "sift",
            "--bind",
            "0.0.0.0:9000",
            "--max-upload-bytes",
            "4096",
        ])
        .unwrap();
        assert_eq!(cli.settings.bind, "0.0.0.0:9000");
        assert_eq!(cli.settings.server_config().max_upload_bytes, 4096);
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let settings = Settings {
            max_upload_bytes: 0,
            ..settings()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("upload"));
    }
}
