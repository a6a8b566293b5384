//! `llmgate chat`: send a prompt through the full gateway pipeline.

use anyhow::Result;
use clap::Args;
use console::style;
use serde_json::json;

use llmgate_types::error::GatewayError;
use llmgate_types::llm::{ChatOptions, ChatRequest, Response, StructuredOutput};

use super::status::{print_status, status_json};
use crate::state::AppState;

#[derive(Args)]
pub struct ChatArgs {
    /// The user prompt.
    pub prompt: String,

    /// System/persona text sent ahead of the prompt.
    #[arg(long)]
    pub system: Option<String>,

    /// Request JSON output and extract the first JSON object from the reply.
    #[arg(long)]
    pub json_mode: bool,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Route name; each route has its own circuit breaker.
    #[arg(long, default_value = "default")]
    pub route: String,

    /// Caller identity for rate limiting and cache scoping.
    #[arg(long)]
    pub caller: Option<String>,

    /// Never fail over to the backup provider.
    #[arg(long)]
    pub primary_only: bool,

    /// Tokens this call takes from the caller's bucket.
    #[arg(long, default_value_t = 1.0, value_parser = parse_cost)]
    pub cost: f64,

    /// Skip the response cache for this call.
    #[arg(long)]
    pub no_cache: bool,

    /// Send the same request N times (exercises cache, bucket, and breaker).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Print breaker and bucket status afterwards.
    #[arg(long)]
    pub status: bool,
}

impl ChatArgs {
    fn request(&self) -> ChatRequest {
        let mut request = ChatRequest::new(self.prompt.clone()).with_json_mode(self.json_mode);
        if let Some(system) = &self.system {
            request = request.with_system(system.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    fn options(&self) -> ChatOptions {
        let mut options = ChatOptions::new(self.route.clone()).with_cost(self.cost);
        if let Some(caller) = &self.caller {
            options = options.with_caller(caller.clone());
        }
        if self.primary_only {
            options = options.primary_only();
        }
        if self.no_cache {
            options = options.bypass_cache();
        }
        options
    }
}

/// Bucket cost: a finite, non-negative number.
pub fn parse_cost(raw: &str) -> Result<f64, String> {
    let cost: f64 = raw.parse().map_err(|e| format!("invalid cost '{raw}': {e}"))?;
    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("cost must be a finite number >= 0, got {raw}"));
    }
    Ok(cost)
}

/// Run `chat`. Fails only when every attempt failed.
pub async fn run_chat(state: &AppState, args: ChatArgs, json: bool) -> Result<()> {
    let gateway = state.gateway()?;
    let request = args.request();
    let options = args.options();

    let mut results = Vec::with_capacity(args.repeat as usize);
    let mut failures = 0;
    let mut last_error = None;

    for attempt in 1..=args.repeat {
        let outcome = gateway.chat(&request, &options).await;
        if json {
            results.push(outcome_json(&outcome));
        } else {
            print_outcome(attempt, args.repeat, &outcome);
        }
        if let Err(err) = outcome {
            failures += 1;
            last_error = Some(err);
        }
    }

    if json {
        let mut document = json!({ "results": results });
        if args.status {
            document["status"] = status_json(&gateway, options.caller());
        }
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else if args.status {
        print_status(&gateway, options.caller());
    }

    match last_error {
        Some(err) if failures == args.repeat => Err(err.into()),
        _ => Ok(()),
    }
}

/// Stable machine-readable label for a gateway failure.
pub fn error_kind(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::Provider(_) => "provider",
        GatewayError::CircuitOpen { .. } => "circuit_open",
        GatewayError::RateLimited { .. } => "rate_limited",
    }
}

fn outcome_json(outcome: &Result<Response, GatewayError>) -> serde_json::Value {
    match outcome {
        Ok(response) => json!({ "response": response }),
        Err(err) => json!({
            "error": { "kind": error_kind(err), "message": err.to_string() }
        }),
    }
}

fn print_outcome(attempt: u32, repeat: u32, outcome: &Result<Response, GatewayError>) {
    if repeat > 1 {
        println!("{}", style(format!("── attempt {attempt}/{repeat} ──")).dim());
    }
    match outcome {
        Ok(response) => print_response(response),
        Err(err) => eprintln!(
            "  {} {} {}",
            style("✗").red(),
            style(format!("[{}]", error_kind(err))).yellow(),
            err
        ),
    }
}

fn print_response(response: &Response) {
    println!("{}", response.text);

    match &response.structured {
        Some(StructuredOutput::Parsed { value }) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!();
            println!("  {} structured output:", style("✓").green());
            println!("{pretty}");
        }
        Some(StructuredOutput::Failed { error }) => {
            println!();
            println!("  {} no JSON recovered: {error}", style("!").yellow());
        }
        None => {}
    }

    let mut footer = format!("{} · {}", response.provider, response.model);
    if let Some(usage) = &response.usage {
        footer.push_str(&format!(
            " · {} in / {} out",
            usage.input_tokens, usage.output_tokens
        ));
        if let Some(cost) = usage.cost_usd {
            footer.push_str(&format!(" · ${cost:.6}"));
        }
    }
    println!("{}", style(footer).dim());
}
