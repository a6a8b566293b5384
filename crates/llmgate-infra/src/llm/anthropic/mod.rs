//! Anthropic Messages API provider.
//!
//! [`AnthropicProvider`] implements
//! [`LlmProvider`](llmgate_core::llm::provider::LlmProvider) for
//! `/v1/messages`. Anthropic has no JSON-mode flag and no embeddings
//! endpoint, so both capabilities are reported as absent.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
