//! Resilience pipeline for llmgate.
//!
//! Defines the provider "port" (`LlmProvider`) that llmgate-infra
//! implements, plus the admission, circuit-breaking, caching and failover
//! logic that sits in front of it. Depends only on `llmgate-types` --
//! never on `llmgate-infra` or any HTTP crate.

pub mod gateway;
pub mod llm;

#[cfg(test)]
pub(crate) mod test_support;
