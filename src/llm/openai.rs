//! `OpenAI` client.

use super::{LlmHttpConfig, LlmProvider, SseEvent, build_http_client, error_kind, read_sse_events};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::BufReader;

/// Marker data of the final stream event.
const DONE_MARKER: &str = "[DONE]";

/// `OpenAI` LLM client.
pub struct OpenAiClient {
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

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Default response token budget.
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    /// Creates a new `OpenAI` client.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
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

    /// Validates that the client is configured.
    fn validate(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: "OPENAI_API_KEY not set".to_string(),
            })
    }

    /// Checks if the model is a reasoning-family model.
    ///
    /// These models use `max_completion_tokens` instead of `max_tokens`
    /// and only support the default temperature.
    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("gpt-5")
            || self.model.starts_with("o1")
            || self.model.starts_with("o3")
    }

    fn build_request(&self, system: Option<&str>, user: &str, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user.to_string(),
        });

        if self.is_reasoning_model() {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: None,
                max_completion_tokens: Some(self.max_tokens),
                temperature: None,
                stream,
            }
        } else {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: Some(self.max_tokens),
                max_completion_tokens: None,
                temperature: Some(0.8),
                stream,
            }
        }
    }

    /// Sends a request and returns the successful response.
    fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::blocking::Response> {
        let api_key = self.validate()?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            stream = request.stream,
            "Making LLM request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .map_err(|e| {
                let kind = error_kind(&e);
                tracing::error!(
                    provider = "openai",
                    model = %self.model,
                    error = %e,
                    error_kind = kind,
                    "LLM request failed"
                );
                Error::OperationFailed {
                    operation: "openai_request".to_string(),
                    cause: format!("{kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "openai",
                model = %self.model,
                status = %status,
                body = %body,
                "LLM API returned error status"
            );
            return Err(Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        Ok(response)
    }

    fn request(&self, system: Option<&str>, user: &str) -> Result<String> {
        let request = self.build_request(system, user, false);
        let response: ChatCompletionResponse =
            self.send(&request)?
                .json()
                .map_err(|e| Error::OperationFailed {
                    operation: "openai_response".to_string(),
                    cause: e.to_string(),
                })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::OperationFailed {
                operation: "openai_response".to_string(),
                cause: "No choices in response".to_string(),
            })
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
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
            let Some(delta) = parse_stream_chunk(event)? else {
                return Ok(false);
            };
            if !delta.is_empty() {
                on_delta(&delta);
                text.push_str(&delta);
            }
            Ok(true)
        })?;

        tracing::debug!(provider = "openai", chars = text.len(), "LLM stream finished");
        Ok(text)
    }
}

/// Extracts the text delta of one chat completion chunk.
///
/// Returns `None` at the `[DONE]` marker and an empty string for chunks
/// without content (role headers, finish reasons).
fn parse_stream_chunk(event: &SseEvent) -> Result<Option<String>> {
    let data = event.data.trim();
    if data == DONE_MARKER {
        return Ok(None);
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| Error::OperationFailed {
            operation: "openai_stream".to_string(),
            cause: format!("Invalid stream chunk: {e}"),
        })?;

    Ok(Some(
        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .unwrap_or_default(),
    ))
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    /// Token limit for GPT-4 and earlier models.
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Token limit for reasoning models.
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

/// A message in the chat.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// One streamed chunk.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(data: &str) -> SseEvent {
        SseEvent {
            event: None,
            data: data.to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::new();
        assert_eq!(client.name(), "openai");
        assert_eq!(client.model, OpenAiClient::DEFAULT_MODEL);
    }

    #[test]
    fn test_client_configuration() {
        let client = OpenAiClient::new()
            .with_api_key("test-key")
            .with_endpoint("https://custom.endpoint")
            .with_model("gpt-4")
            .with_max_tokens(300);

        assert_eq!(client.api_key, Some("test-key".to_string()));
        assert_eq!(client.endpoint, "https://custom.endpoint");
        assert_eq!(client.model, "gpt-4");
        assert_eq!(client.max_tokens, 300);
    }

    #[test]
    fn test_validate_no_key() {
        let client = OpenAiClient {
            api_key: None,
            endpoint: OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            model: OpenAiClient::DEFAULT_MODEL.to_string(),
            max_tokens: OpenAiClient::DEFAULT_MAX_TOKENS,
            client: reqwest::blocking::Client::new(),
        };
        assert!(client.validate().is_err());
        assert_eq!(OpenAiClient::new().with_api_key("k").validate().unwrap(), "k");
    }

    #[test]
    fn test_reasoning_model_detection() {
        assert!(OpenAiClient::new().with_model("gpt-5-mini").is_reasoning_model());
        assert!(OpenAiClient::new().with_model("o1-preview").is_reasoning_model());
        assert!(OpenAiClient::new().with_model("o3-mini").is_reasoning_model());
        assert!(!OpenAiClient::new().with_model("gpt-4o").is_reasoning_model());
        assert!(!OpenAiClient::new().with_model("gpt-3.5-turbo").is_reasoning_model());
    }

    #[test]
    fn test_request_serialization() {
        let client = OpenAiClient::new().with_model("gpt-4o");
        let json = serde_json::to_value(client.build_request(Some("sys"), "hi", true)).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], OpenAiClient::DEFAULT_MAX_TOKENS);
        assert_eq!(json["stream"], true);

        let client = OpenAiClient::new().with_model("o3-mini");
        let json = serde_json::to_value(client.build_request(None, "hi", false)).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_parse_stream_chunks() {
        let chunk = data(r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"{\"title"}}]}"#);
        assert_eq!(
            parse_stream_chunk(&chunk).unwrap(),
            Some("{\"title".to_string())
        );

        let role = data(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#);
        assert_eq!(parse_stream_chunk(&role).unwrap(), Some(String::new()));

        let usage = data(r#"{"choices":[]}"#);
        assert_eq!(parse_stream_chunk(&usage).unwrap(), Some(String::new()));

        assert_eq!(parse_stream_chunk(&data("[DONE]")).unwrap(), None);
        assert!(parse_stream_chunk(&data("{broken")).is_err());
    }
}
