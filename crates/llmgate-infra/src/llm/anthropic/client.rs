//! AnthropicProvider -- [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends non-streaming requests to `/v1/messages` with the `x-api-key`
//! and `anthropic-version` headers. The API key is wrapped in
//! [`secrecy::SecretString`] and is never logged.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use llmgate_core::llm::provider::{LlmProvider, with_deadline};
use llmgate_types::config::ProviderPricing;
use llmgate_types::error::ProviderError;
use llmgate_types::llm::{ChatRequest, ProviderCapabilities, Response, Usage};

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse};
use crate::llm::pricing::estimate_cost;

/// Anthropic Claude provider.
///
/// # API Key Security
///
/// Does NOT derive Debug. The key is only exposed when building headers.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    provider_name: String,
    base_url: String,
    model: String,
    pricing: Option<ProviderPricing>,
    capabilities: ProviderCapabilities,
}

impl AnthropicProvider {
    const API_VERSION: &'static str = "2023-06-01";
    const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    const MAX_TOKENS: u32 = 1024;

    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            provider_name: "anthropic".to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            pricing: None,
            capabilities: ProviderCapabilities::default(),
        }
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    pub fn with_pricing(mut self, pricing: Option<ProviderPricing>) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// System text goes in the top-level `system` field, not a message.
    fn to_anthropic_request(&self, request: &ChatRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: Self::MAX_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<Response, ProviderError> {
        let body = self.to_anthropic_request(request);

        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::connection(&self.provider_name, format!("HTTP request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::status(
                &self.provider_name,
                status.as_u16(),
                error_body,
            ));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            ProviderError::malformed(&self.provider_name, format!("failed to parse response: {e}"))
        })?;
        let parsed: AnthropicResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            ProviderError::malformed(&self.provider_name, format!("unexpected response shape: {e}"))
        })?;

        let text = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = Usage {
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
            cost_usd: estimate_cost(
                &parsed.model,
                self.pricing.as_ref(),
                parsed.usage.input_tokens,
                parsed.usage.output_tokens,
            ),
        };

        Ok(Response {
            text,
            structured: None,
            raw,
            model: parsed.model,
            provider: self.provider_name.clone(),
            usage: Some(usage),
        })
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn chat(&self, request: &ChatRequest, deadline: Duration) -> Result<Response, ProviderError> {
        let span = tracing::info_span!(
            "gen_ai.chat",
            gen_ai.system = %self.provider_name,
            gen_ai.request.model = %self.model,
            gen_ai.request.temperature = ?request.temperature,
        );
        with_deadline(&self.provider_name, deadline, self.send(request))
            .instrument(span)
            .await
    }
}
