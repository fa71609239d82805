//! JSON extraction from model output
//!
//! Models wrap their JSON in prose or code fences. The payload is taken to be
//! everything from the first `{` to the last `}`; no repair is attempted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::plan::DEFAULT_CONFIDENCE;

static OUTERMOST_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No JSON found in response")]
    NoStructuredPayloadFound,
    #[error("Malformed JSON in response: {0}")]
    MalformedPayload(String),
}

/// Parse the outermost `{...}` span of `raw` as a JSON object.
pub fn extract(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let span = OUTERMOST_OBJECT
        .find(raw)
        .ok_or(ExtractError::NoStructuredPayloadFound)?;

    serde_json::from_str::<Map<String, Value>>(span.as_str())
        .map_err(|e| ExtractError::MalformedPayload(e.to_string()))
}

/// The payload's own `confidence`, clamped to `[0, 1]`.
///
/// Missing, non-numeric or non-finite values fall back to the default.
pub fn confidence_of(payload: &Map<String, Value>) -> f64 {
    payload
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE)
}
