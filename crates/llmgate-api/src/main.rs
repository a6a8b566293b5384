//! llmgate CLI entry point.
//!
//! Binary name: `llmgate`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use llmgate_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "llmgate", &mut std::io::stdout());
        return Ok(());
    }

    let tracing_options = TracingOptions {
        enable_otel: cli.otel,
        verbosity: cli.verbose,
        json_logs: cli.json,
    };
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("failed to set up tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Chat(args) => cli::chat::run_chat(&state, args, cli.json).await,
        Commands::Embed(args) => cli::embed::run_embed(&state, args, cli.json).await,
        Commands::Config { action } => {
            cli::config::handle_config_command(action, &state, cli.json).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
