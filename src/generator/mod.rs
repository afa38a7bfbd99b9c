pub mod anthropic;
pub mod mock;

use async_trait::async_trait;

/// Token usage from a single LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Text produced by one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The client could not be built, e.g. no API key.
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    /// The request never got a response.
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("generation service error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The service answered with a body that is not a Messages response.
    #[error("malformed generation response: {0}")]
    Malformed(serde_json::Error),

    /// The service answered, but with no text to extract.
    #[error("generation service returned no text")]
    EmptyResponse,
}

/// Turns a system prompt plus user content into generated text.
/// Single attempt; callers decide what a failure means.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<Generation, GenerateError>;
}
