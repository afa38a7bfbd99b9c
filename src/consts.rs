//! Project-wide constants.

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Default Anthropic model when none is specified.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Messages API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Upper bound on generated tokens per report.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Generation request timeout in seconds. Reports over large files are slow.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Largest accepted request body. Uploads are CSV text inlined in JSON.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Header carrying the caller identity, set by the fronting identity provider
/// after it has verified the caller.
pub const CALLER_HEADER: &str = "x-authenticated-user";

/// The single collection report records live in.
pub const REPORTS_COLLECTION: &str = "reports";

pub const ENV_DATABASE_URL: &str = "SIFT_DATABASE_URL";
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
