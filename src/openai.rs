//! OpenAI-compatible client configuration.
//!
//! Every model Pustaka talks to (Ollama chat and embeddings, a local Whisper
//! server) speaks the OpenAI wire format, so they share one client factory.

use crate::error::{PustakaError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Placeholder key sent when none is configured. Ollama ignores it.
const LOCAL_API_KEY: &str = "ollama";

/// Create a client for an OpenAI-compatible endpoint with a custom timeout.
///
/// `OPENAI_API_KEY` is forwarded as the bearer token when set.
pub fn create_client_with_timeout(base_url: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| LOCAL_API_KEY.to_string());

    let base = normalize_base_url(base_url)?;
    let config = OpenAIConfig::new().with_api_base(base).with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Validate an endpoint URL and strip any trailing slash.
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| PustakaError::Config(format!("Invalid endpoint URL '{}': {}", base_url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(base_url.trim_end_matches('/').to_string()),
        other => Err(PustakaError::Config(format!(
            "Unsupported URL scheme '{}' in {}",
            other, base_url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:11434/v1/").unwrap(),
            "http://localhost:11434/v1"
        );
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }
}
