//! LlmProvider trait definition.
//!
//! This is the core abstraction that every provider adapter implements.
//! Uses RPITIT for `chat` and `embed`; [`super::box_provider::BoxLlmProvider`]
//! erases the concrete type for runtime selection.

use std::future::Future;
use std::time::Duration;

use llmgate_types::error::ProviderError;
use llmgate_types::llm::{ChatRequest, ProviderCapabilities, Response};

/// Trait for LLM provider adapters (OpenAI-compatible, Anthropic, ...).
///
/// Adapters are stateless after construction: they hold endpoint and
/// credential configuration only. Each call carries its own deadline and
/// must abort the in-flight request when it fires (see [`with_deadline`]).
///
/// Implementations live in llmgate-infra.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "anthropic").
    fn name(&self) -> &str;

    /// What this provider supports beyond chat.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send one chat request and return the normalized response.
    fn chat(
        &self,
        request: &ChatRequest,
        deadline: Duration,
    ) -> impl Future<Output = Result<Response, ProviderError>> + Send;

    /// Embed each text into a vector.
    ///
    /// Providers without an embeddings endpoint keep this default, which
    /// fails with `ProviderErrorKind::Unsupported`.
    fn embed(
        &self,
        texts: &[String],
        deadline: Duration,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, ProviderError>> + Send {
        let _ = (texts, deadline);
        let err = ProviderError::unsupported(self.name(), "embeddings");
        async move { Err(err) }
    }
}

/// Run `call` under a hard deadline.
///
/// Dropping the timed-out future aborts the in-flight HTTP request.
/// Expiry is reported as an ordinary [`ProviderError`] so it counts toward
/// the breaker like any other transport failure.
pub async fn with_deadline<T, F>(
    provider: &str,
    deadline: Duration,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(provider, deadline_ms = deadline.as_millis() as u64, "Provider call timed out");
            Err(ProviderError::timeout(provider, deadline.as_millis()))
        }
    }
}
