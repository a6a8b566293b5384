//! `llmgate embed`: embed texts through the gateway.

use anyhow::Result;
use clap::Args;
use console::style;
use serde_json::json;

use llmgate_types::llm::ChatOptions;

use crate::state::AppState;

#[derive(Args)]
pub struct EmbedArgs {
    /// Texts to embed.
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Route name; each route has its own circuit breaker.
    #[arg(long, default_value = "embeddings")]
    pub route: String,

    /// Caller identity for rate limiting.
    #[arg(long)]
    pub caller: Option<String>,

    /// Never fail over to the backup provider.
    #[arg(long)]
    pub primary_only: bool,

    /// Tokens this call takes from the caller's bucket.
    #[arg(long, default_value_t = 1.0, value_parser = super::chat::parse_cost)]
    pub cost: f64,
}

pub async fn run_embed(state: &AppState, args: EmbedArgs, json: bool) -> Result<()> {
    let gateway = state.gateway()?;

    let mut options = ChatOptions::new(args.route).with_cost(args.cost);
    if let Some(caller) = args.caller {
        options = options.with_caller(caller);
    }
    if args.primary_only {
        options = options.primary_only();
    }

    let vectors = gateway.embed(&args.texts, &options).await?;

    if json {
        let items: Vec<_> = args
            .texts
            .iter()
            .zip(&vectors)
            .map(|(text, embedding)| json!({ "text": text, "embedding": embedding }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!();
    for (text, embedding) in args.texts.iter().zip(&vectors) {
        println!(
            "  {} {} {}",
            style("•").cyan(),
            super::status::truncate(text, 40),
            style(format!("[{} dims] {}", embedding.len(), preview(embedding))).dim()
        );
    }
    println!();
    Ok(())
}

/// First few components of a vector, for display.
fn preview(embedding: &[f32]) -> String {
    let head: Vec<String> = embedding.iter().take(4).map(|v| format!("{v:.4}")).collect();
    if embedding.len() > 4 {
        format!("{}, ...", head.join(", "))
    } else {
        head.join(", ")
    }
}
