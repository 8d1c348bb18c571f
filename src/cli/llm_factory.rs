//! LLM client factory functions for CLI commands.
//!
//! Provides builders for creating LLM clients from configuration.

use std::sync::Arc;

use crate::config::{LlmConfig, LlmProviderKind};
use crate::llm::{AnthropicClient, LlmHttpConfig, LlmProvider, OpenAiClient};

/// Builds HTTP configuration from LLM config with environment overrides.
#[must_use]
pub fn build_http_config(llm_config: &LlmConfig) -> LlmHttpConfig {
    LlmHttpConfig::from_config(llm_config).with_env_overrides()
}

/// Builds an `OpenAI` client from configuration.
#[must_use]
pub fn build_openai_client(llm_config: &LlmConfig) -> OpenAiClient {
    let mut client = OpenAiClient::new();
    if let Some(api_key) = llm_config.resolved_api_key() {
        client = client.with_api_key(api_key);
    }
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    if let Some(max_tokens) = llm_config.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }
    client.with_http_config(build_http_config(llm_config))
}

/// Builds an Anthropic client from configuration.
#[must_use]
pub fn build_anthropic_client(llm_config: &LlmConfig) -> AnthropicClient {
    let mut client = AnthropicClient::new();
    if let Some(api_key) = llm_config.resolved_api_key() {
        client = client.with_api_key(api_key);
    }
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    if let Some(max_tokens) = llm_config.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }
    client.with_http_config(build_http_config(llm_config))
}

/// Builds the configured LLM provider.
#[must_use]
pub fn build_llm_provider(llm_config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match llm_config.provider {
        LlmProviderKind::Anthropic => Arc::new(build_anthropic_client(llm_config)),
        LlmProviderKind::OpenAi => Arc::new(build_openai_client(llm_config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_llm_provider_follows_config() {
        let anthropic = build_llm_provider(&LlmConfig::default());
        assert_eq!(anthropic.name(), "anthropic");

        let openai = build_llm_provider(&LlmConfig {
            provider: LlmProviderKind::OpenAi,
            model: Some("gpt-4o-mini".to_string()),
            timeout_ms: Some(1_000),
            ..Default::default()
        });
        assert_eq!(openai.name(), "openai");
    }

    #[test]
    fn test_build_http_config_uses_config_values() {
        let config = LlmConfig {
            connect_timeout_ms: Some(250),
            ..Default::default()
        };
        assert_eq!(build_http_config(&config).connect_timeout_ms, 250);
    }
}
