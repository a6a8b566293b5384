//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](llmgate_core::llm::provider::LlmProvider)
//! adapters plus a provider factory ([`create_provider`]) that constructs
//! the right adapter from a [`ProviderConfig`], and [`build_gateway`] which
//! wires primary, backup, and the pipeline settings into a [`Gateway`].

pub mod anthropic;
pub mod openai_compat;
pub mod pricing;

use secrecy::SecretString;

use llmgate_core::gateway::Gateway;
use llmgate_core::llm::box_provider::BoxLlmProvider;
use llmgate_core::llm::client::UnifiedClient;
use llmgate_types::config::{GatewayConfig, ProviderConfig, ProviderType};
use llmgate_types::error::{ConfigError, ProviderError};
use llmgate_types::llm::ChatRequest;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Create a [`BoxLlmProvider`] from a [`ProviderConfig`] and its resolved key.
pub fn create_provider(config: &ProviderConfig, api_key: SecretString) -> BoxLlmProvider {
    match config.provider_type {
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key, config.model.clone())
                .with_name(config.name.clone())
                .with_pricing(config.pricing.clone());
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            BoxLlmProvider::new(provider)
        }
        ProviderType::OpenAiCompatible => {
            let mut oai = openai_compat::config::defaults_for(&config.name, api_key, &config.model);
            if let Some(base_url) = config.base_url.as_deref() {
                oai.base_url = base_url.to_string();
            }
            if config.embedding_model.is_some() {
                oai.embedding_model = config.embedding_model.clone();
            }
            oai.pricing = config.pricing.clone();
            BoxLlmProvider::new(OpenAiCompatibleProvider::new(oai))
        }
    }
}

/// Read the provider's credential from the environment.
pub fn resolve_api_key(config: &ProviderConfig) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(config, |var| std::env::var(var).ok())
}

/// Resolve a credential through `lookup` (the environment in production).
pub fn resolve_api_key_with(
    config: &ProviderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let var = config.api_key_env();
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
        Some(_) => Err(ConfigError::MissingCredential {
            provider: config.name.clone(),
            reason: format!("environment variable {var} is empty"),
        }),
        None => Err(ConfigError::MissingCredential {
            provider: config.name.clone(),
            reason: format!("environment variable {var} is not set"),
        }),
    }
}

/// Build the full gateway: validate config, resolve credentials, and
/// construct primary (and backup, when configured) adapters.
pub fn build_gateway(config: &GatewayConfig) -> Result<Gateway, ConfigError> {
    build_gateway_with(config, |var| std::env::var(var).ok())
}

pub fn build_gateway_with(
    config: &GatewayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Gateway, ConfigError> {
    config.validate()?;

    let primary_key = resolve_api_key_with(&config.primary, &lookup)?;
    let primary = create_provider(&config.primary, primary_key);
    let mut client = UnifiedClient::new(primary, config.deadline());

    if let Some(backup_config) = &config.backup {
        let backup_key = resolve_api_key_with(backup_config, &lookup)?;
        client = client.with_backup(create_provider(backup_config, backup_key));
    }

    tracing::info!(
        primary = %config.primary.name,
        backup = config.backup.as_ref().map(|b| b.name.as_str()).unwrap_or("none"),
        deadline_ms = config.deadline_ms,
        "Gateway configured"
    );

    Ok(Gateway::new(client, config))
}

/// Send a tiny prompt straight to `provider` to verify the credential and
/// endpoint, bypassing cache, limiter, and breaker.
pub async fn test_provider_connection(
    provider: &BoxLlmProvider,
    deadline: std::time::Duration,
) -> Result<(), ProviderError> {
    let request = ChatRequest::new("Hello").with_temperature(0.0);
    provider.chat(&request, deadline).await?;
    Ok(())
}
