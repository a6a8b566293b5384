//! Application state: the loaded configuration and, on demand, the gateway
//! built from it.

use std::path::Path;

use anyhow::{Context, Result};

use llmgate_core::gateway::Gateway;
use llmgate_types::config::GatewayConfig;

pub struct AppState {
    pub config: GatewayConfig,
}

impl AppState {
    /// Load configuration from `--config`, `LLMGATE_CONFIG`, or the default path.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = llmgate_infra::config::load_config(config_path)
            .await
            .context("Failed to load configuration")?;
        tracing::debug!(
            primary = %config.primary.name,
            backup = config.backup.is_some(),
            "Configuration loaded"
        );
        Ok(Self { config })
    }

    /// Resolve credentials and construct the gateway.
    pub fn gateway(&self) -> Result<Gateway> {
        llmgate_infra::llm::build_gateway(&self.config).context("Failed to build gateway")
    }
}
