//! Anthropic Claude client.

use super::{LlmHttpConfig, LlmProvider, SseEvent, build_http_client, error_kind, read_sse_events};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::BufReader;

/// Anthropic Claude LLM client.
pub struct AnthropicClient {
    /// API key.
    api_key: Option<String>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// Maximum tokens per response.
    max_tokens: u32,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "claude-3-5-haiku-20241022";

    /// Default response token budget; a chapter runs to a few hundred words.
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    /// Creates a new Anthropic client.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        Self {
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            client: build_http_client(LlmHttpConfig::from_env()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the response token budget.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets HTTP client timeouts for LLM requests.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Validates that the client is configured with a plausible API key.
    fn validate(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::OperationFailed {
                operation: "anthropic_request".to_string(),
                cause: "ANTHROPIC_API_KEY not set".to_string(),
            })?;

        if !Self::is_valid_api_key_format(key) {
            return Err(Error::OperationFailed {
                operation: "anthropic_request".to_string(),
                cause: "Invalid API key format: expected 'sk-ant-' prefix".to_string(),
            });
        }

        Ok(key)
    }

    /// Checks if an API key has a valid format.
    ///
    /// Valid keys start with `sk-ant-`, are at least 40 characters and
    /// contain only alphanumerics, hyphens and underscores.
    fn is_valid_api_key_format(key: &str) -> bool {
        const MIN_KEY_LENGTH: usize = 40;
        const PREFIX: &str = "sk-ant-";

        if !key.starts_with(PREFIX) || key.len() < MIN_KEY_LENGTH {
            return false;
        }

        key.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn build_request(&self, system: Option<&str>, user: &str, stream: bool) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.filter(|s| !s.is_empty()).map(str::to_string),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            stream,
        }
    }

    /// Sends a request and returns the successful response.
    fn send(&self, request: &MessagesRequest) -> Result<reqwest::blocking::Response> {
        let api_key = self.validate()?;

        tracing::info!(
            provider = "anthropic",
            model = %self.model,
            stream = request.stream,
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(request)
            .send()
            .map_err(|e| {
                let kind = error_kind(&e);
                tracing::error!(
                    provider = "anthropic",
                    model = %self.model,
                    error = %e,
                    error_kind = kind,
                    "LLM request failed"
                );
                Error::OperationFailed {
                    operation: "anthropic_request".to_string(),
                    cause: format!("{kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "anthropic",
                model = %self.model,
                status = %status,
                body = %body,
                "LLM API returned error status"
            );
            return Err(Error::OperationFailed {
                operation: "anthropic_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        Ok(response)
    }

    fn request(&self, system: Option<&str>, user: &str) -> Result<String> {
        let request = self.build_request(system, user, false);
        let response: MessagesResponse =
            self.send(&request)?
                .json()
                .map_err(|e| Error::OperationFailed {
                    operation: "anthropic_response".to_string(),
                    cause: e.to_string(),
                })?;

        response
            .content
            .iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text.clone())
            .ok_or_else(|| Error::OperationFailed {
                operation: "anthropic_response".to_string(),
                cause: "No text content in response".to_string(),
            })
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.request(None, prompt)
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.request(Some(system), user)
    }

    fn stream_with_system(
        &self,
        system: &str,
        user: &str,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let request = self.build_request(Some(system), user, true);
        let response = self.send(&request)?;

        let mut text = String::new();
        read_sse_events(BufReader::new(response), |event| {
            match handle_stream_event(event)? {
                StreamStep::Delta(delta) => {
                    on_delta(&delta);
                    text.push_str(&delta);
                    Ok(true)
                },
                StreamStep::Skip => Ok(true),
                StreamStep::Stop => Ok(false),
            }
        })?;

        tracing::debug!(provider = "anthropic", chars = text.len(), "LLM stream finished");
        Ok(text)
    }
}

/// What to do with one stream event.
#[derive(Debug, PartialEq, Eq)]
enum StreamStep {
    Delta(String),
    Skip,
    Stop,
}

/// Interprets one Messages API stream event.
fn handle_stream_event(event: &SseEvent) -> Result<StreamStep> {
    match event.event.as_deref() {
        Some("message_stop") => Ok(StreamStep::Stop),
        Some("error") => Err(Error::OperationFailed {
            operation: "anthropic_stream".to_string(),
            cause: event.data.clone(),
        }),
        Some("content_block_delta") => {
            let payload: StreamPayload =
                serde_json::from_str(&event.data).map_err(|e| Error::OperationFailed {
                    operation: "anthropic_stream".to_string(),
                    cause: format!("Invalid stream event: {e}"),
                })?;
            Ok(payload
                .delta
                .and_then(|d| d.text)
                .map_or(StreamStep::Skip, StreamStep::Delta))
        },
        _ => Ok(StreamStep::Skip),
    }
}

/// Request to the Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Response from the Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// A content block in the response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Body of a `content_block_delta` event.
#[derive(Debug, Deserialize)]
struct StreamPayload {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> SseEvent {
        SseEvent {
            event: Some(name.to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new();
        assert_eq!(client.name(), "anthropic");
        assert_eq!(client.model, AnthropicClient::DEFAULT_MODEL);
        assert_eq!(client.max_tokens, AnthropicClient::DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_client_configuration() {
        let client = AnthropicClient::new()
            .with_api_key("test-key")
            .with_endpoint("https://custom.endpoint")
            .with_model("claude-3-opus-20240229")
            .with_max_tokens(512);

        assert_eq!(client.api_key, Some("test-key".to_string()));
        assert_eq!(client.endpoint, "https://custom.endpoint");
        assert_eq!(client.model, "claude-3-opus-20240229");
        assert_eq!(client.max_tokens, 512);
    }

    #[test]
    fn test_validate_no_key() {
        let client = AnthropicClient {
            api_key: None,
            endpoint: AnthropicClient::DEFAULT_ENDPOINT.to_string(),
            model: AnthropicClient::DEFAULT_MODEL.to_string(),
            max_tokens: AnthropicClient::DEFAULT_MAX_TOKENS,
            client: reqwest::blocking::Client::new(),
        };
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_is_valid_api_key_format() {
        assert!(AnthropicClient::is_valid_api_key_format(
            "sk-ant-REDACTED"
        ));
        assert!(!AnthropicClient::is_valid_api_key_format(""));
        assert!(!AnthropicClient::is_valid_api_key_format("sk-ant-"));
        assert!(!AnthropicClient::is_valid_api_key_format(
            "sk-other-api03-ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
        ));
        assert!(!AnthropicClient::is_valid_api_key_format(
            "sk-ant-REDACTED!@#$"
        ));
    }

    #[test]
    fn test_streaming_request_serialization() {
        let client = AnthropicClient::new();
        let request = client.build_request(Some("sys"), "hi", true);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "sys");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["content"], "hi");

        let request = client.build_request(Some(""), "hi", false);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_handle_stream_events() {
        let delta = event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"{\"ti"}}"#,
        );
        assert_eq!(
            handle_stream_event(&delta).unwrap(),
            StreamStep::Delta("{\"ti".to_string())
        );

        let ping = event("ping", r#"{"type":"ping"}"#);
        assert_eq!(handle_stream_event(&ping).unwrap(), StreamStep::Skip);

        let stop = event("message_stop", r#"{"type":"message_stop"}"#);
        assert_eq!(handle_stream_event(&stop).unwrap(), StreamStep::Stop);

        let error = event("error", r#"{"type":"overloaded_error"}"#);
        assert!(handle_stream_event(&error).is_err());

        let garbage = event("content_block_delta", "not json");
        assert!(handle_stream_event(&garbage).is_err());
    }
}
