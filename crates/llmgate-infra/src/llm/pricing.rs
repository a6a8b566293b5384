//! Cost estimation for provider responses.
//!
//! A small built-in table covers well-known models; a provider's
//! configured [`ProviderPricing`] always takes precedence. Unknown models
//! get no estimate rather than a guess.

use llmgate_types::config::ProviderPricing;

struct PricingEntry {
    model_pattern: &'static str,
    input_cost_per_million: f64,
    output_cost_per_million: f64,
}

/// Approximate USD per million tokens. More specific patterns come first.
const DEFAULT_PRICING: &[PricingEntry] = &[
    PricingEntry {
        model_pattern: "gpt-4o-mini",
        input_cost_per_million: 0.15,
        output_cost_per_million: 0.60,
    },
    PricingEntry {
        model_pattern: "gpt-4o",
        input_cost_per_million: 2.50,
        output_cost_per_million: 10.0,
    },
    PricingEntry {
        model_pattern: "claude-sonnet-4",
        input_cost_per_million: 3.0,
        output_cost_per_million: 15.0,
    },
    PricingEntry {
        model_pattern: "claude-haiku",
        input_cost_per_million: 0.80,
        output_cost_per_million: 4.0,
    },
    PricingEntry {
        model_pattern: "llama-3.1-8b",
        input_cost_per_million: 0.05,
        output_cost_per_million: 0.08,
    },
];

/// Resolve pricing for `model`, preferring the configured override.
pub fn lookup_pricing(model: &str, configured: Option<&ProviderPricing>) -> Option<ProviderPricing> {
    if let Some(pricing) = configured {
        return Some(pricing.clone());
    }
    DEFAULT_PRICING
        .iter()
        .find(|entry| model.contains(entry.model_pattern))
        .map(|entry| ProviderPricing {
            input_cost_per_million: entry.input_cost_per_million,
            output_cost_per_million: entry.output_cost_per_million,
        })
}

/// Estimated USD cost of one call.
pub fn estimate_cost(
    model: &str,
    configured: Option<&ProviderPricing>,
    input_tokens: u32,
    output_tokens: u32,
) -> Option<f64> {
    let pricing = lookup_pricing(model, configured)?;
    Some(
        (input_tokens as f64 * pricing.input_cost_per_million
            + output_tokens as f64 * pricing.output_cost_per_million)
            / 1_000_000.0,
    )
}
