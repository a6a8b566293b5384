//! Gateway configuration loader.
//!
//! Resolves `config.toml` from (in order) an explicit path, the
//! `LLMGATE_CONFIG` environment variable, or `{config_dir}/llmgate/config.toml`,
//! and deserializes it into [`GatewayConfig`]. A missing file at the implicit
//! locations yields defaults; an explicit path must exist.

use std::path::{Path, PathBuf};

use llmgate_types::config::GatewayConfig;
use llmgate_types::error::ConfigError;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV_VAR: &str = "LLMGATE_CONFIG";

/// `{config_dir}/llmgate/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("llmgate").join("config.toml"))
}

/// Where to read configuration from, and whether the file must exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub required: bool,
}

/// Pick the config file: explicit path, then `env_override`, then the
/// platform default.
pub fn resolve_config_source(
    explicit: Option<&Path>,
    env_override: Option<PathBuf>,
) -> Option<ConfigSource> {
    if let Some(path) = explicit {
        return Some(ConfigSource {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Some(path) = env_override {
        return Some(ConfigSource {
            path,
            required: true,
        });
    }
    default_config_path().map(|path| ConfigSource {
        path,
        required: false,
    })
}

/// Load and validate gateway configuration.
pub async fn load_config(explicit: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let env_override = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    match resolve_config_source(explicit, env_override) {
        Some(source) => load_config_from(&source).await,
        None => Ok(GatewayConfig::default()),
    }
}

/// Load configuration from one resolved source.
pub async fn load_config_from(source: &ConfigSource) -> Result<GatewayConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(&source.path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !source.required => {
            tracing::debug!("No config.toml found at {}, using defaults", source.path.display());
            return Ok(GatewayConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: source.path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    let config = parse_config(&content)?;
    tracing::debug!(path = %source.path.display(), "Loaded gateway config");
    Ok(config)
}

/// Parse and validate TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn optional(path: PathBuf) -> ConfigSource {
        ConfigSource {
            path,
            required: false,
        }
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let source = resolve_config_source(
            Some(Path::new("/tmp/explicit.toml")),
            Some(PathBuf::from("/tmp/env.toml")),
        )
        .unwrap();
        assert_eq!(source.path, PathBuf::from("/tmp/explicit.toml"));
        assert!(source.required);

        let source = resolve_config_source(None, Some(PathBuf::from("/tmp/env.toml"))).unwrap();
        assert_eq!(source.path, PathBuf::from("/tmp/env.toml"));
    }

    #[tokio::test]
    async fn missing_optional_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_from(&optional(tmp.path().join("config.toml")))
            .await
            .unwrap();
        assert_eq!(config.deadline_ms, 30_000);
        assert_eq!(config.primary.name, "openai");
    }

    #[tokio::test]
    async fn missing_required_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let source = ConfigSource {
            path: tmp.path().join("absent.toml"),
            required: true,
        };
        assert!(matches!(
            load_config_from(&source).await,
            Err(ConfigError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
deadline_ms = 5000

[primary]
name = "groq"
provider_type = "openai_compatible"
model = "llama-3.1-8b-instant"

[backup]
name = "claude"
provider_type = "anthropic"
model = "claude-haiku-4-5"

[breaker]
threshold = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config_from(&optional(path)).await.unwrap();
        assert_eq!(config.deadline_ms, 5000);
        assert_eq!(config.primary.name, "groq");
        assert_eq!(config.backup.as_ref().unwrap().name, "claude");
        assert_eq!(config.breaker.threshold, 5);
        assert_eq!(config.breaker.cooldown_ms, 15_000);
    }

    #[tokio::test]
    async fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        assert!(matches!(
            load_config_from(&optional(path)).await,
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn parse_rejects_invalid_values() {
        let err = parse_config("[bucket]\nrefill_per_second = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
