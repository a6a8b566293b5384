//! Shared domain types for llmgate.
//!
//! Request/response contract, configuration, and error taxonomy used by
//! every other crate in the workspace.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod llm;
