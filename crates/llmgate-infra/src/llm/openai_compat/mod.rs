//! OpenAI-compatible provider adapter.
//!
//! A single [`OpenAiCompatibleProvider`] serves OpenAI, Groq, Gemini's
//! OpenAI endpoint, and any proxy speaking the same protocol, via
//! configurable base URLs. Requests are plain `reqwest` POSTs with a
//! bearer credential; the decoded body is kept verbatim as `Response::raw`.

pub mod config;
pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use llmgate_core::llm::provider::{LlmProvider, with_deadline};
use llmgate_types::config::ProviderPricing;
use llmgate_types::error::ProviderError;
use llmgate_types::llm::{ChatRequest, ProviderCapabilities, Response, Usage};

use super::pricing::estimate_cost;

use self::config::OpenAiCompatConfig;
use self::types::{
    ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse,
    ResponseFormat, WireMessage,
};

/// Provider adapter for any OpenAI-compatible chat-completions API.
///
/// # API Key Security
///
/// Does NOT derive Debug; the key lives in a [`SecretString`] and is only
/// exposed while building the `Authorization` header.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    provider_name: String,
    base_url: String,
    model: String,
    embedding_model: Option<String>,
    pricing: Option<ProviderPricing>,
    capabilities: ProviderCapabilities,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let mut capabilities = config.capabilities;
        capabilities.embeddings = config.embedding_model.is_some();

        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key,
            provider_name: config.provider_name,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            embedding_model: config.embedding_model,
            pricing: config.pricing,
            capabilities,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the wire request: system message first (if any), then the prompt.
    fn build_request(&self, request: &ChatRequest) -> ChatCompletionRequest {
        let messages = request
            .messages()
            .into_iter()
            .map(|m| WireMessage {
                role: m.role.to_string(),
                content: m.content,
            })
            .collect();

        let response_format = (request.json_mode && self.capabilities.json_mode)
            .then(ResponseFormat::json_object);

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            response_format,
        }
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
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

        response.json().await.map_err(|e| {
            ProviderError::malformed(&self.provider_name, format!("failed to parse response: {e}"))
        })
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<Response, ProviderError> {
        let body = self.build_request(request);
        let raw = self.post_json("/chat/completions", &body).await?;

        let parsed: ChatCompletionResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            ProviderError::malformed(&self.provider_name, format!("unexpected response shape: {e}"))
        })?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                ProviderError::malformed(&self.provider_name, "response has no message content")
            })?;

        let model = parsed.model.unwrap_or_else(|| self.model.clone());
        let usage = parsed.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            cost_usd: estimate_cost(
                &model,
                self.pricing.as_ref(),
                u.prompt_tokens,
                u.completion_tokens,
            ),
        });

        Ok(Response {
            text,
            structured: None,
            raw,
            model,
            provider: self.provider_name.clone(),
            usage,
        })
    }

    async fn send_embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = EmbeddingRequest { model, input: texts };
        let raw = self.post_json("/embeddings", &body).await?;

        let mut parsed: EmbeddingResponse = serde_json::from_value(raw).map_err(|e| {
            ProviderError::malformed(&self.provider_name, format!("unexpected embeddings shape: {e}"))
        })?;
        if parsed.data.len() != texts.len() {
            return Err(ProviderError::malformed(
                &self.provider_name,
                format!("expected {} embeddings, got {}", texts.len(), parsed.data.len()),
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
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
        with_deadline(&self.provider_name, deadline, self.send_chat(request))
            .instrument(span)
            .await
    }

    async fn embed(&self, texts: &[String], deadline: Duration) -> Result<Vec<Vec<f32>>, ProviderError> {
        let Some(model) = self.embedding_model.as_deref() else {
            return Err(ProviderError::unsupported(&self.provider_name, "embeddings"));
        };
        let span = tracing::info_span!(
            "gen_ai.embeddings",
            gen_ai.system = %self.provider_name,
            gen_ai.request.model = %model,
        );
        with_deadline(&self.provider_name, deadline, self.send_embed(model, texts))
            .instrument(span)
            .await
    }
}
