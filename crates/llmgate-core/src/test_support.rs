//! Scripted provider used by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use llmgate_types::error::{ProviderError, ProviderErrorKind};
use llmgate_types::llm::{ChatRequest, ProviderCapabilities, Response, Usage};

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::{LlmProvider, with_deadline};

#[derive(Debug, Clone)]
pub(crate) enum MockOutcome {
    Reply(String),
    Fail(ProviderErrorKind),
}

pub(crate) struct MockProvider {
    name: String,
    capabilities: ProviderCapabilities,
    outcome: Arc<Mutex<MockOutcome>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub(crate) fn ok(name: &str, reply: &str) -> Self {
        Self::with_outcome(name, MockOutcome::Reply(reply.to_string()))
    }

    pub(crate) fn failing(name: &str) -> Self {
        Self::with_outcome(name, MockOutcome::Fail(ProviderErrorKind::Status(500)))
    }

    fn with_outcome(name: &str, outcome: MockOutcome) -> Self {
        Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities::default(),
            outcome: Arc::new(Mutex::new(outcome)),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_embeddings(mut self) -> Self {
        self.capabilities.embeddings = true;
        self
    }

    /// Shared call counter; survives boxing the provider.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Handle for switching the outcome after the provider is boxed.
    pub(crate) fn outcome(&self) -> Arc<Mutex<MockOutcome>> {
        Arc::clone(&self.outcome)
    }

    pub(crate) fn boxed(self) -> BoxLlmProvider {
        BoxLlmProvider::new(self)
    }
}

pub(crate) fn call_count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}

pub(crate) fn set_outcome(handle: &Arc<Mutex<MockOutcome>>, outcome: MockOutcome) {
    *handle.lock().unwrap() = outcome;
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn chat(&self, request: &ChatRequest, deadline: Duration) -> Result<Response, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.lock().unwrap().clone();
        let delay = self.delay;
        let name = self.name.clone();

        with_deadline(&self.name, deadline, async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match outcome {
                MockOutcome::Reply(text) => Ok(Response {
                    raw: serde_json::json!({ "mock": name, "text": text, "prompt": request.prompt }),
                    text,
                    structured: None,
                    model: format!("{name}-model"),
                    provider: name,
                    usage: Some(Usage {
                        input_tokens: 1,
                        output_tokens: 1,
                        cost_usd: None,
                    }),
                }),
                MockOutcome::Fail(kind) => Err(ProviderError::new(name, kind, "scripted failure")),
            }
        })
        .await
    }

    async fn embed(&self, texts: &[String], _deadline: Duration) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.capabilities.embeddings {
            return Err(ProviderError::unsupported(&self.name, "embeddings"));
        }
        if let MockOutcome::Fail(kind) = self.outcome.lock().unwrap().clone() {
            return Err(ProviderError::new(&self.name, kind, "scripted failure"));
        }
        Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
    }
}
