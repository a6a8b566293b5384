//! LLM request/response types for llmgate.
//!
//! These types model the provider-agnostic call contract: one
//! [`ChatRequest`] in, one [`Response`] out, regardless of which vendor
//! answered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JsonExtractionError;

/// Caller key used when a request carries no caller identity.
pub const ANONYMOUS_CALLER: &str = "anon";

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a vendor message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// A chat request as supplied by the caller.
///
/// Immutable once built; the same value is handed to the primary and,
/// on failure, to the backup provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Ask the provider for a JSON object and run the safe extractor on the reply.
    #[serde(default)]
    pub json_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChatRequest {
    /// Plain-text request with no system text.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            json_mode: false,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ordered message list: system text first (if any), then the prompt.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message {
                role: MessageRole::System,
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: MessageRole::User,
            content: self.prompt.clone(),
        });
        messages
    }
}

/// Token usage and estimated cost for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Estimated spend in USD, when pricing for the model is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Outcome of running the safe JSON extractor over a reply.
///
/// A failed extraction is data, not an error: the caller still has
/// [`Response::text`] and [`Response::raw`] to fall back on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StructuredOutput {
    Parsed { value: serde_json::Value },
    Failed { error: JsonExtractionError },
}

impl StructuredOutput {
    /// The parsed value, if extraction succeeded.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            StructuredOutput::Parsed { value } => Some(value),
            StructuredOutput::Failed { .. } => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, StructuredOutput::Parsed { .. })
    }
}

impl From<Result<serde_json::Value, JsonExtractionError>> for StructuredOutput {
    fn from(result: Result<serde_json::Value, JsonExtractionError>) -> Self {
        match result {
            Ok(value) => StructuredOutput::Parsed { value },
            Err(error) => StructuredOutput::Failed { error },
        }
    }
}

/// Response from a successful chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Text extracted from the provider payload.
    pub text: String,
    /// Present only for `json_mode` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredOutput>,
    /// The provider's payload exactly as received.
    pub raw: serde_json::Value,
    /// Model that produced the answer, as reported by the provider.
    pub model: String,
    /// Name of the provider that answered.
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// What an adapter can do beyond `chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// The provider accepts a native JSON-output flag.
    pub json_mode: bool,
    /// The provider exposes an embeddings endpoint.
    pub embeddings: bool,
}

/// Per-call routing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Call-site identifier; partitions breaker state and cache entries.
    pub route: String,
    /// Caller identity; partitions token buckets and cache entries.
    #[serde(default)]
    pub caller_key: Option<String>,
    /// Never fall back to the backup provider.
    #[serde(default)]
    pub primary_only: bool,
    /// Tokens this call takes from the caller's bucket.
    #[serde(default = "default_cost")]
    pub cost: f64,
    /// Skip the cache lookup and store for this call.
    #[serde(default)]
    pub bypass_cache: bool,
}

fn default_cost() -> f64 {
    1.0
}

impl ChatOptions {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            caller_key: None,
            primary_only: false,
            cost: default_cost(),
            bypass_cache: false,
        }
    }

    pub fn with_caller(mut self, caller_key: impl Into<String>) -> Self {
        self.caller_key = Some(caller_key.into());
        self
    }

    pub fn primary_only(mut self) -> Self {
        self.primary_only = true;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn bypass_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// The caller key, or [`ANONYMOUS_CALLER`] when none was given.
    pub fn caller(&self) -> &str {
        self.caller_key.as_deref().unwrap_or(ANONYMOUS_CALLER)
    }
}

/// Status of one route's circuit breaker (for CLI display).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerStatus {
    pub route: String,
    /// One of "closed", "open", "half_open".
    pub state: String,
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub last_error: Option<String>,
    /// Milliseconds until an open circuit admits a probe.
    pub retry_in_ms: Option<u64>,
    /// RFC 3339 timestamp of the most recent failure.
    pub last_failure_at: Option<String>,
}
