//! Configuration types and per-provider defaults for OpenAI-compatible providers.
//!
//! Each vendor that speaks the OpenAI chat-completions protocol gets a
//! factory function returning an [`OpenAiCompatConfig`] with the right
//! base URL and capabilities.

use secrecy::SecretString;

use llmgate_types::config::ProviderPricing;
use llmgate_types::llm::ProviderCapabilities;

/// Configuration for an OpenAI-compatible provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai", "groq").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    /// Embeddings are disabled when `None`.
    pub embedding_model: Option<String>,
    pub pricing: Option<ProviderPricing>,
    pub capabilities: ProviderCapabilities,
}

/// OpenAI default configuration.
///
/// Base URL: `https://api.openai.com/v1`. JSON mode and embeddings.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
        embedding_model: Some("text-embedding-3-small".into()),
        pricing: None,
        capabilities: ProviderCapabilities {
            json_mode: true,
            embeddings: true,
        },
    }
}

/// Groq default configuration.
///
/// Base URL: `https://api.groq.com/openai/v1`. JSON mode, no embeddings.
pub fn groq_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "groq".into(),
        base_url: "https://api.groq.com/openai/v1".into(),
        api_key,
        model: model.into(),
        embedding_model: None,
        pricing: None,
        capabilities: ProviderCapabilities {
            json_mode: true,
            embeddings: false,
        },
    }
}

/// Google Gemini default configuration (OpenAI-compatible endpoint).
///
/// Base URL: `https://generativelanguage.googleapis.com/v1beta/openai`
pub fn gemini_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "gemini".into(),
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
        api_key,
        model: model.into(),
        embedding_model: Some("text-embedding-004".into()),
        pricing: None,
        capabilities: ProviderCapabilities {
            json_mode: true,
            embeddings: true,
        },
    }
}

/// Look up defaults by well-known provider name.
///
/// Unknown names get the OpenAI defaults under their own name.
pub fn defaults_for(name: &str, api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    match name {
        "groq" => groq_defaults(api_key, model),
        "gemini" => gemini_defaults(api_key, model),
        _ => {
            let mut config = openai_defaults(api_key, model);
            config.provider_name = name.to_string();
            config
        }
    }
}
