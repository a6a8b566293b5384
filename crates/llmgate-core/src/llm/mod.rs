//! LLM provider abstractions for llmgate.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider adapters
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `UnifiedClient`: primary/backup failover

pub mod box_provider;
pub mod client;
pub mod provider;
