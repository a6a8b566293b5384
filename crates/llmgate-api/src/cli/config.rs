//! `llmgate config`: show the effective configuration or verify it.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use serde_json::json;

use llmgate_infra::llm::{create_provider, resolve_api_key, test_provider_connection};
use llmgate_types::config::{GatewayConfig, ProviderConfig};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (credentials are never shown).
    Show,

    /// Validate the configuration and test each provider's connection.
    Check {
        /// Only validate; do not contact providers.
        #[arg(long)]
        skip_test: bool,
    },
}

pub async fn handle_config_command(cmd: ConfigCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Show => config_show(&state.config, json),
        ConfigCommand::Check { skip_test } => config_check(&state.config, skip_test, json).await,
    }
}

/// Whether the credential variable for `provider` is set, without revealing it.
fn credential_state(provider: &ProviderConfig) -> &'static str {
    match resolve_api_key(provider) {
        Ok(_) => "set",
        Err(_) => "missing",
    }
}

fn config_show(config: &GatewayConfig, json: bool) -> Result<()> {
    if json {
        let mut document = serde_json::to_value(config)?;
        document["credentials"] = credentials_json(config);
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render config as TOML")?;
    println!("{rendered}");
    for provider in slots(config) {
        println!(
            "# {} key ({}): {}",
            provider.name,
            provider.api_key_env(),
            credential_state(provider)
        );
    }
    Ok(())
}

fn credentials_json(config: &GatewayConfig) -> serde_json::Value {
    slots(config)
        .map(|p| {
            (
                p.name.clone(),
                json!({ "env": p.api_key_env(), "state": credential_state(p) }),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn slots(config: &GatewayConfig) -> impl Iterator<Item = &ProviderConfig> {
    std::iter::once(&config.primary).chain(config.backup.as_ref())
}

async fn config_check(config: &GatewayConfig, skip_test: bool, json: bool) -> Result<()> {
    config.validate().context("Configuration is invalid")?;

    let mut report = Vec::new();
    let mut all_ok = true;

    for provider_config in slots(config) {
        let outcome = match resolve_api_key(provider_config) {
            Err(e) => Err(e.to_string()),
            Ok(_) if skip_test => Ok(()),
            Ok(key) => {
                let provider = create_provider(provider_config, key);
                test_provider_connection(&provider, config.deadline())
                    .await
                    .map_err(|e| e.to_string())
            }
        };
        all_ok &= outcome.is_ok();
        report.push((provider_config.name.clone(), outcome));
    }

    if json {
        let items: Vec<_> = report
            .iter()
            .map(|(name, outcome)| match outcome {
                Ok(()) => json!({ "provider": name, "ok": true }),
                Err(e) => json!({ "provider": name, "ok": false, "error": e }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "valid": true, "providers": items }))?);
    } else {
        println!();
        println!("  {} Configuration is valid", style("✓").green());
        for (name, outcome) in &report {
            match outcome {
                Ok(()) if skip_test => println!("  {} {name}: credential present", style("✓").green()),
                Ok(()) => println!("  {} {name}: connection OK", style("✓").green()),
                Err(e) => println!("  {} {name}: {e}", style("✗").red()),
            }
        }
        println!();
    }

    if !all_ok {
        anyhow::bail!("one or more providers failed the check");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_include_backup() {
        let mut config = GatewayConfig::default();
        assert_eq!(slots(&config).count(), 1);
        config.backup = Some(ProviderConfig {
            name: "backup".into(),
            ..ProviderConfig::default()
        });
        let names: Vec<_> = slots(&config).map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["openai", "backup"]);
    }

    #[test]
    fn test_credentials_json_names_env_var_only() {
        let config = GatewayConfig {
            primary: ProviderConfig {
                api_key_env: Some("LLMGATE_TEST_UNSET_KEY".into()),
                ..ProviderConfig::default()
            },
            ..GatewayConfig::default()
        };
        let creds = credentials_json(&config);
        assert_eq!(creds["openai"]["env"], "LLMGATE_TEST_UNSET_KEY");
        assert_eq!(creds["openai"]["state"], "missing");
    }
}
