//! OpenAI-compatible client configuration.
//!
//! Both generation services and the Whisper transcriber speak the OpenAI wire format; only
//! the base URL, key, and a few headers differ.

use crate::error::{Result, SkrivError};
use async_openai::{config::OpenAIConfig, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection parameters for one OpenAI-compatible endpoint.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions<'a> {
    pub api_key: &'a str,
    pub base_url: Option<&'a str>,
    pub headers: Option<&'a BTreeMap<String, String>>,
    pub timeout: Option<Duration>,
}

/// Create a client for the given endpoint.
pub fn create_client(options: ClientOptions<'_>) -> Result<Client<OpenAIConfig>> {
    let timeout = options
        .timeout
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(headers) = options.headers.filter(|h| !h.is_empty()) {
        builder = builder.default_headers(header_map(headers)?);
    }

    let http_client = builder.build()?;

    let mut config = OpenAIConfig::new().with_api_key(options.api_key);
    if let Some(base_url) = options.base_url {
        // async-openai joins paths with a leading slash
        config = config.with_api_base(base_url.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SkrivError::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SkrivError::Config(format!("Invalid value for header {}: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Title".to_string(), "skriv".to_string());
        let map = header_map(&headers).unwrap();
        assert_eq!(map.get("x-title").unwrap(), "skriv");
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad Header".to_string(), "x".to_string());
        assert!(matches!(header_map(&headers), Err(SkrivError::Config(_))));
    }

    #[test]
    fn test_create_client() {
        let client = create_client(ClientOptions {
            api_key: "sk-test",
            base_url: Some("https://openrouter.ai/api/v1/"),
            ..Default::default()
        });
        assert!(client.is_ok());
    }
}
