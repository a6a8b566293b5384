//! Breaker and bucket snapshot rendering.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use llmgate_core::gateway::Gateway;
use llmgate_types::llm::BreakerStatus;

/// JSON snapshot of every breaker plus `caller`'s bucket.
pub fn status_json(gateway: &Gateway, caller: &str) -> serde_json::Value {
    json!({
        "breakers": gateway.breaker_status(),
        "bucket": {
            "caller": caller,
            "tokens": gateway.bucket_tokens(caller),
            "capacity": gateway.bucket_capacity(),
        },
    })
}

/// Print the breaker table and `caller`'s remaining tokens.
pub fn print_status(gateway: &Gateway, caller: &str) {
    let statuses = gateway.breaker_status();

    println!();
    println!("  {}", style("Gateway Status").bold());
    println!();

    if statuses.is_empty() {
        println!("  {} No routes called yet.", style("i").blue().bold());
    } else {
        println!("{}", breaker_table(&statuses));
    }

    let tokens = gateway
        .bucket_tokens(caller)
        .map(|t| format!("{t:.2}"))
        .unwrap_or_else(|| "full".to_string());
    println!();
    println!(
        "  Bucket for {}: {} / {}",
        style(caller).cyan(),
        style(tokens).bold(),
        gateway.bucket_capacity()
    );
    println!();
}

fn breaker_table(statuses: &[BreakerStatus]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Route").fg(Color::White),
        Cell::new("Circuit").fg(Color::White),
        Cell::new("Failures").fg(Color::White),
        Cell::new("Calls").fg(Color::White),
        Cell::new("Retry In").fg(Color::White),
        Cell::new("Last Error").fg(Color::White),
    ]);

    for status in statuses {
        let circuit_cell = match status.state.as_str() {
            "closed" => Cell::new("closed").fg(Color::Green),
            "open" => Cell::new("OPEN").fg(Color::Red),
            "half_open" => Cell::new("half_open").fg(Color::Yellow),
            other => Cell::new(other).fg(Color::White),
        };

        let retry = status
            .retry_in_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&status.route).fg(Color::Cyan),
            circuit_cell,
            Cell::new(format!(
                "{} ({} total)",
                status.consecutive_failures, status.total_failures
            ))
            .fg(Color::White),
            Cell::new(status.total_calls).fg(Color::White),
            Cell::new(retry).fg(Color::DarkGrey),
            Cell::new(truncate(status.last_error.as_deref().unwrap_or("-"), 40))
                .fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Shorten `text` to at most `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
