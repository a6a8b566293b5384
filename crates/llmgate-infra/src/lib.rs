//! Infrastructure layer for llmgate.
//!
//! Concrete provider adapters (OpenAI-compatible, Anthropic) over `reqwest`,
//! the provider/gateway factory, and TOML config loading.

pub mod config;
pub mod llm;
