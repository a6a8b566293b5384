//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! 1. Define an object-safe `LlmProviderDyn` trait with boxed futures
//! 2. Blanket-impl `LlmProviderDyn` for all `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::time::Duration;

use futures_util::future::BoxFuture;

use llmgate_types::error::ProviderError;
use llmgate_types::llm::{ChatRequest, ProviderCapabilities, Response};

use super::provider::LlmProvider;

/// Object-safe version of [`LlmProvider`] with boxed futures.
pub trait LlmProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &ProviderCapabilities;

    fn chat_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
        deadline: Duration,
    ) -> BoxFuture<'a, Result<Response, ProviderError>>;

    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
        deadline: Duration,
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, ProviderError>>;
}

impl<T: LlmProvider> LlmProviderDyn for T {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        LlmProvider::capabilities(self)
    }

    fn chat_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
        deadline: Duration,
    ) -> BoxFuture<'a, Result<Response, ProviderError>> {
        Box::pin(self.chat(request, deadline))
    }

    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
        deadline: Duration,
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
        Box::pin(self.embed(texts, deadline))
    }
}

/// Type-erased provider for runtime selection of the primary/backup slots.
///
/// Since `LlmProvider` uses RPITIT, it cannot be used as a trait object
/// directly; this wrapper delegates to the `LlmProviderDyn` trait object.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        self.inner.capabilities()
    }

    pub async fn chat(
        &self,
        request: &ChatRequest,
        deadline: Duration,
    ) -> Result<Response, ProviderError> {
        self.inner.chat_boxed(request, deadline).await
    }

    pub async fn embed(
        &self,
        texts: &[String],
        deadline: Duration,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.inner.embed_boxed(texts, deadline).await
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .finish()
    }
}
