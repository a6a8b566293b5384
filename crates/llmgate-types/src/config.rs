//! Gateway configuration types.
//!
//! `GatewayConfig` mirrors the `config.toml` accepted by the `llmgate`
//! binary. Every tunable has a default, so an empty file (or none at all)
//! yields a working OpenAI-backed gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Hard deadline for every outbound provider call.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    #[serde(default)]
    pub primary: ProviderConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<ProviderConfig>,

    #[serde(default)]
    pub breaker: BreakerConfig,

    #[serde(default)]
    pub bucket: BucketConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_deadline_ms() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            primary: ProviderConfig::default(),
            backup: None,
            breaker: BreakerConfig::default(),
            bucket: BucketConfig::default(),
            cache: CacheConfig::default(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl GatewayConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Reject values that would make the pipeline reject or admit everything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_ms == 0 {
            return Err(ConfigError::Invalid("deadline_ms must be > 0".into()));
        }
        if self.breaker.threshold == 0 {
            return Err(ConfigError::Invalid("breaker.threshold must be > 0".into()));
        }
        if !(self.bucket.capacity > 0.0) {
            return Err(ConfigError::Invalid("bucket.capacity must be > 0".into()));
        }
        if !(self.bucket.refill_per_second > 0.0) {
            return Err(ConfigError::Invalid(
                "bucket.refill_per_second must be > 0".into(),
            ));
        }
        self.primary.validate()?;
        if let Some(backup) = &self.backup {
            backup.validate()?;
            if backup.name == self.primary.name {
                return Err(ConfigError::Invalid(format!(
                    "primary and backup share the name '{}'",
                    backup.name
                )));
            }
        }
        Ok(())
    }
}

/// Type of provider backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    Anthropic,
}

impl ProviderType {
    /// Environment variable consulted when `api_key_env` is not set.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderType::OpenAiCompatible => "OPENAI_API_KEY",
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
            ProviderType::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai_compatible" | "openai" => Ok(ProviderType::OpenAiCompatible),
            "anthropic" => Ok(ProviderType::Anthropic),
            other => Err(format!("invalid provider type: '{other}'")),
        }
    }
}

/// Configuration for one provider slot (primary or backup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Human-readable name (e.g., "openai", "groq", "anthropic").
    pub name: String,
    pub provider_type: ProviderType,
    /// Override the provider type's default base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    /// Model used by `embed`; embeddings are disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Overrides the built-in pricing table for cost estimation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ProviderPricing>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".into(),
            provider_type: ProviderType::OpenAiCompatible,
            base_url: None,
            model: "gpt-4o-mini".into(),
            embedding_model: Some("text-embedding-3-small".into()),
            api_key_env: None,
            pricing: None,
        }
    }
}

impl ProviderConfig {
    /// The environment variable the credential is read from.
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider_type.default_api_key_env())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("provider name must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "provider '{}' has an empty model",
                self.name
            )));
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' base_url must be http(s): '{url}'",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// USD cost per million tokens for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPricing {
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
}

/// Per-route circuit breaker parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// How long an open circuit rejects calls before probing.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_threshold() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    15_000
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Per-caller token bucket parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
}

fn default_capacity() -> f64 {
    10.0
}

fn default_refill_per_second() -> f64 {
    2.0
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_second: default_refill_per_second(),
        }
    }
}

/// Response cache parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    120
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
