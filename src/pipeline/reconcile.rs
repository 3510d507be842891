//! Financial reconciliation.
//!
//! Totals are recomputed from raw line items and written over whatever
//! the extraction model reported: the grant total from the project's
//! budgeted expenses, the expense total from the extracted lines, and
//! the remainder from their difference. Placeholder values the model
//! emits for unreadable fields are backfilled from project metadata.

use thiserror::Error;

use crate::models::project::ProjectMetadata;
use crate::models::report::{format_wire_number, ExpenseLineItem, FinancialSummary, StructuredReport};

/// Strings the extraction model emits when a field is not found on the
/// form. Fields matching one of these (or blank after trimming) are
/// backfilled from metadata. Extend here if a new model phrasing shows
/// up in review.
pub const PLACEHOLDER_VALUES: &[&str] = &["Not available", "غير متوفر"];

/// Fallback written when metadata has no value to backfill with.
const NOT_AVAILABLE: &str = "Not available";

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("computed totals are not finite (grant {grant}, expenses {expenses})")]
    NonFiniteTotals { grant: f64, expenses: f64 },
}

/// Parse the leading numeric prefix of a string, 0 on failure — the
/// coercion every wire amount goes through.
pub fn coerce_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => end = i + 1,
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return 0.0;
    }
    trimmed[..end].parse().unwrap_or(0.0)
}

/// Grant total: Σ frequency × unit price over the project's budgeted
/// expenses.
pub fn grant_total(metadata: &ProjectMetadata) -> f64 {
    metadata
        .expenses
        .iter()
        .map(|e| coerce_amount(&e.frequency) * coerce_amount(&e.unit_price))
        .sum()
}

/// Expense total: Σ amount over extracted expense lines.
pub fn expenses_total(expenses: &[ExpenseLineItem]) -> f64 {
    expenses.iter().map(|e| coerce_amount(&e.amount)).sum()
}

/// Prompt-time summary: the grant is known before extraction, expenses
/// are not, so the remainder equals the grant.
pub fn prefill_summary(metadata: &ProjectMetadata) -> FinancialSummary {
    let grant = grant_total(metadata);
    FinancialSummary {
        total_expenses: "0".to_string(),
        total_grant_received: format_wire_number(grant),
        total_other_sources: String::new(),
        remainder: format_wire_number(grant),
    }
}

/// Recompute the report's financial summary and backfill placeholder
/// fields. Overwrites the model's self-reported totals. Idempotent:
/// re-running with the same metadata changes nothing.
pub fn reconcile(
    report: &mut StructuredReport,
    metadata: &ProjectMetadata,
) -> Result<(), ReconcileError> {
    let grant = grant_total(metadata);
    let expenses = expenses_total(&report.expenses);

    if !grant.is_finite() || !expenses.is_finite() {
        return Err(ReconcileError::NonFiniteTotals { grant, expenses });
    }

    let remainder = grant - expenses;
    report.financial_summary.total_expenses = format_wire_number(expenses);
    report.financial_summary.total_grant_received = format_wire_number(grant);
    report.financial_summary.remainder = format_wire_number(remainder);

    if is_placeholder(&report.err_id) {
        report.err_id = metadata
            .err
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    }

    let activities = metadata.planned_activities_summary();
    for expense in &mut report.expenses {
        if is_placeholder(&expense.activity) {
            expense.activity = activities.clone();
        }
    }

    Ok(())
}

/// Blank after trimming, or one of the known placeholder strings.
fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed)
}
