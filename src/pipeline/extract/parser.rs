//! Completion-response parsing.
//!
//! One parse path for every call site: slice the response to its
//! outermost `{...}` (models occasionally wrap JSON in prose even in
//! JSON mode), then parse strictly. Anything that fails after the slice
//! is a malformed response, surfaced as an error — never a partially
//! populated report.

use super::ExtractError;
use crate::models::report::{ReportBatch, StructuredReport};

/// Slice a response down to the outermost JSON object.
pub fn json_boundary(response: &str) -> Result<&str, ExtractError> {
    let start = response.find('{').ok_or(ExtractError::MissingJson)?;
    let end = response.rfind('}').ok_or(ExtractError::MissingJson)?;
    if end < start {
        return Err(ExtractError::MissingJson);
    }
    Ok(&response[start..=end])
}

/// Parse a single-form extraction response.
pub fn parse_report(response: &str) -> Result<StructuredReport, ExtractError> {
    let json = json_boundary(response)?;
    serde_json::from_str(json).map_err(|e| ExtractError::InvalidJson(e.to_string()))
}

/// Parse a batch extraction response: `{ "forms": [ ... ] }`.
pub fn parse_report_batch(response: &str) -> Result<Vec<StructuredReport>, ExtractError> {
    let json = json_boundary(response)?;
    let batch: ReportBatch =
        serde_json::from_str(json).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;
    Ok(batch.forms)
}
