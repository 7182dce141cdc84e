//! Anthropic Messages API provider.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::UpstreamError;

use super::ResponseProvider;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Live provider speaking the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    /// Build a provider from configuration and an already-resolved API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Connection {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Map an HTTP error status to a structured upstream error.
    fn map_http_error(status: reqwest::StatusCode, body: &str, retry_after: u64) -> UpstreamError {
        match status.as_u16() {
            401 | 403 => UpstreamError::AuthFailed {
                message: format!("HTTP {status}: {body}"),
            },
            429 => UpstreamError::RateLimited {
                retry_after_secs: retry_after,
            },
            400 | 404 | 422 => UpstreamError::MalformedRequest {
                message: format!("HTTP {status}: {body}"),
            },
            _ => UpstreamError::Connection {
                message: format!("HTTP {status}: {body}"),
            },
        }
    }
}

/// Parse a Retry-After header as whole seconds, defaulting when missing or
/// malformed.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(30)
}

#[async_trait::async_trait]
impl ResponseProvider for AnthropicProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: user_message,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    UpstreamError::Connection {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(status, &body, retry_after));
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| UpstreamError::ResponseParse {
                    message: e.to_string(),
                })?;

        let text = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(UpstreamError::ResponseParse {
                message: "Response contained no text content".to_string(),
            });
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
