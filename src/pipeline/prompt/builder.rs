//! Prompt assembly: text cleaning plus single-pass placeholder
//! substitution.
//!
//! Substitution scans the template once and looks each `${name}` up in
//! a value map. A substituted value that itself contains a placeholder
//! token is emitted verbatim — it can never be re-expanded, which the
//! old sequential-replace approach could not guarantee.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::project::{ProjectMetadata, NOT_PROVIDED};
use crate::models::report::FinancialSummary;

/// Static guidance fragment for table-heavy forms.
const TABLE_PROCESSING_HINT: &str =
    "Detect and structure tables by identifying columns (e.g., Item, Quantity, Price) and rows.";

/// Static guidance fragment for linking known project metadata.
const METADATA_HINT: &str =
    "Ensure metadata fields like 'Project Objectives' and 'Beneficiaries' are linked correctly.";

/// Strip control characters, collapse whitespace runs to single spaces,
/// and trim. Applied to OCR text before it enters a prompt.
///
/// Control stripping runs first and removes newlines and tabs outright,
/// so words separated only by a line break merge — prompts see the form
/// as one flowed paragraph.
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !('\u{0000}'..='\u{001F}').contains(c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assemble the value map for every placeholder a report template may
/// carry. Missing metadata fields substitute `"Not provided"`.
pub fn prompt_values(
    cleaned_text: &str,
    metadata: &ProjectMetadata,
    summary: &FinancialSummary,
) -> HashMap<&'static str, String> {
    let mut values = HashMap::new();
    values.insert("cleanedText", cleaned_text.to_string());
    values.insert(
        "projectMetadata.project_objectives",
        field_or_not_provided(metadata.project_objectives.as_deref()),
    );
    values.insert(
        "projectMetadata.intended_beneficiaries",
        field_or_not_provided(metadata.intended_beneficiaries.as_deref()),
    );
    values.insert(
        "projectMetadata.err_id",
        field_or_not_provided(metadata.err.as_deref()),
    );
    values.insert(
        "financial_summary.total_grant_received",
        summary.total_grant_received.clone(),
    );
    values.insert(
        "financial_summary.total_expenses",
        summary.total_expenses.clone(),
    );
    values.insert("financial_summary.remainder", summary.remainder.clone());
    values.insert("expenses.activity", metadata.planned_activities_summary());
    values.insert("table_processing", TABLE_PROCESSING_HINT.to_string());
    values.insert("metadata_hint", METADATA_HINT.to_string());
    values
}

/// Substitute `${name}` placeholders in a single pass. Names missing
/// from the map are left in place so a malformed template fails loudly
/// in review rather than silently dropping a section.
pub fn build_prompt(template: &str, values: &HashMap<&'static str, String>) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_.]+)\}").expect("valid placeholder regex"));

    re.replace_all(template, |caps: &regex::Captures<'_>| {
        match values.get(caps.get(1).map(|m| m.as_str()).unwrap_or_default()) {
            Some(value) => value.clone(),
            None => caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string(),
        }
    })
    .into_owned()
}

fn field_or_not_provided(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_PROVIDED.to_string(),
    }
}
