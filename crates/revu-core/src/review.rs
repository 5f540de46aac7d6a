//! HTTP client for the review service.
//!
//! One endpoint: POST {server_url}/ai/get-review with a JSON body carrying
//! the code under review. The response body is the review itself (markdown,
//! by convention) and is returned verbatim.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;

/// Standard User-Agent header for review requests.
pub const USER_AGENT: &str = concat!("revu/", env!("CARGO_PKG_VERSION"));

/// Review server used when neither flag, env var, nor config sets one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Environment variable overriding the configured review server URL.
pub const SERVER_URL_ENV: &str = "REVU_SERVER_URL";

/// Shown in place of a review when the request fails for any reason.
pub const FALLBACK_MESSAGE: &str = "⚠️ Error connecting to server";

const REVIEW_PATH: &str = "/ai/get-review";

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    code: &'a str,
}

/// Client for the review endpoint.
///
/// Carries no request timeout; the session-level busy state is the only
/// thing gating concurrent use.
#[derive(Debug, Clone)]
pub struct ReviewClient {
    base_url: String,
    http: reqwest::Client,
}

impl ReviewClient {
    /// Creates a client for the given server base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Returns the server base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submits code for review and returns the response body verbatim.
    ///
    /// # Errors
    /// Any transport or server failure (unreachable host, non-2xx status,
    /// unreadable body) is an error; callers map it to [`FALLBACK_MESSAGE`]
    /// for display.
    pub async fn request_review(&self, code: &str) -> Result<String> {
        let request_id = uuid::Uuid::new_v4();
        let url = format!("{}{REVIEW_PATH}", self.base_url);

        tracing::info!(%request_id, %url, bytes = code.len(), "submitting code for review");

        let response = self
            .http
            .post(&url)
            .json(&ReviewRequest { code })
            .send()
            .await
            .with_context(|| format!("Failed to reach review server at {url}"))?;

        let response = response
            .error_for_status()
            .context("Review server returned an error status")?;

        let body = response
            .text()
            .await
            .context("Failed to read review response body")?;

        tracing::info!(%request_id, bytes = body.len(), "review received");

        Ok(body)
    }
}

/// Resolves the review server URL with precedence: CLI flag > env > config > default.
///
/// # Errors
/// Returns an error if the winning value is not a well-formed URL.
pub fn resolve_server_url(cli_override: Option<&str>, config: &Config) -> Result<String> {
    // Try the CLI flag first
    if let Some(flag_url) = cli_override {
        let trimmed = flag_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, "--server-url")?;
            return Ok(trimmed.to_string());
        }
    }

    // Try env var
    if let Ok(env_url) = std::env::var(SERVER_URL_ENV) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, SERVER_URL_ENV)?;
            return Ok(trimmed.to_string());
        }
    }

    // Try config value
    if let Some(config_url) = config.effective_server_url() {
        validate_url(config_url, "server_url")?;
        return Ok(config_url.to_string());
    }

    // Default
    Ok(DEFAULT_SERVER_URL.to_string())
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str, source: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {source} URL: {url}"))?;
    Ok(())
}
