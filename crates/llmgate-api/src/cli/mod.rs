//! CLI command definitions for the `llmgate` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod config;
pub mod embed;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Resilient gateway in front of hosted LLM providers.
#[derive(Parser)]
#[command(name = "llmgate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed logs (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to config.toml (overrides LLMGATE_CONFIG and the default location).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a prompt through the gateway.
    Chat(chat::ChatArgs),

    /// Embed one or more texts.
    Embed(embed::EmbedArgs),

    /// Inspect or verify the effective configuration.
    Config {
        #[command(subcommand)]
        action: config::ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "llmgate",
            "--json",
            "-vv",
            "chat",
            "hello",
            "--route",
            "summaries",
            "--caller",
            "alice",
            "--json-mode",
            "--repeat",
            "3",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Chat(args) = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(args.prompt, "hello");
        assert_eq!(args.route, "summaries");
        assert_eq!(args.caller.as_deref(), Some("alice"));
        assert!(args.json_mode);
        assert_eq!(args.repeat, 3);
        assert!(!args.primary_only);
    }

    #[test]
    fn test_repeat_must_be_positive() {
        assert!(Cli::try_parse_from(["llmgate", "chat", "hi", "--repeat", "0"]).is_err());
    }

    #[test]
    fn test_parse_embed_requires_text() {
        assert!(Cli::try_parse_from(["llmgate", "embed"]).is_err());
        let cli = Cli::try_parse_from(["llmgate", "embed", "a", "b"]).unwrap();
        let Commands::Embed(args) = cli.command else {
            panic!("expected embed");
        };
        assert_eq!(args.texts, vec!["a", "b"]);
    }
}
