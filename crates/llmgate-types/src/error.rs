use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single adapter call failed.
///
/// Every kind counts the same toward a route's circuit breaker; the kind
/// is kept for logs and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The request never got a response (DNS, TLS, refused, reset).
    Connection,
    /// The provider answered with a non-success HTTP status.
    Status(u16),
    /// The per-call deadline fired before the provider answered.
    Timeout,
    /// The body could not be decoded or lacked the expected fields.
    MalformedBody,
    /// The adapter does not implement the requested capability.
    Unsupported,
}

/// A failed call to one specific provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider '{provider}' failed ({kind:?}): {message}")]
pub struct ProviderError {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn connection(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Connection, message)
    }

    pub fn status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Status(status), body)
    }

    pub fn timeout(provider: impl Into<String>, deadline_ms: u128) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Timeout,
            format!("deadline of {deadline_ms}ms exceeded"),
        )
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::MalformedBody, message)
    }

    pub fn unsupported(provider: impl Into<String>, capability: &str) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Unsupported,
            format!("{capability} is not supported by this provider"),
        )
    }
}

/// Errors surfaced by the gateway pipeline.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("circuit open for route '{route}' (retry in {retry_in_ms}ms)")]
    CircuitOpen { route: String, retry_in_ms: u64 },

    #[error("rate limited: caller '{caller}' has insufficient tokens")]
    RateLimited { caller: String },
}

/// No JSON object could be recovered from a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonExtractionError {
    #[error("no '{{' found in reply")]
    NoOpeningBrace,

    #[error("no '}}' found after the first '{{'")]
    NoClosingBrace,

    #[error("invalid JSON between braces: {0}")]
    InvalidJson(String),
}

/// Errors loading or validating gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("no credential for provider '{provider}': {reason}")]
    MissingCredential { provider: String, reason: String },
}
