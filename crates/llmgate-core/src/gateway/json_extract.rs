//! Safe JSON extraction from free-form provider text.
//!
//! Providers asked for JSON often wrap the object in prose. The extractor
//! slices from the first `{` to the last `}` and parses that. Prose that
//! itself contains braces outside the intended object defeats the
//! heuristic; that limit is accepted.

use llmgate_types::error::JsonExtractionError;
use serde_json::Value;

/// Recover a JSON object embedded in `text`.
pub fn extract_json(text: &str) -> Result<Value, JsonExtractionError> {
    let start = text.find('{').ok_or(JsonExtractionError::NoOpeningBrace)?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or(JsonExtractionError::NoClosingBrace)?;

    serde_json::from_str(&text[start..=end])
        .map_err(|e| JsonExtractionError::InvalidJson(e.to_string()))
}
