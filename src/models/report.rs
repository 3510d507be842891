use serde::{Deserialize, Deserializer, Serialize};

use super::project::ProjectMetadata;

/// One reimbursable expense line extracted from a scanned form.
///
/// All fields default to empty strings — the extraction model omits
/// anything it cannot read, and downstream reconciliation fills the
/// gaps it can.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseLineItem {
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payment_date: String,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub receipt_no: String,
    /// Numeric-as-string in the wire format; models sometimes emit a bare
    /// number instead, so deserialization accepts both.
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
}

/// Report-level financial totals. Numeric-as-string in the wire format.
///
/// `total_expenses`, `total_grant_received` and `remainder` are
/// authoritative only after reconciliation — the extraction model's
/// self-reported values are overwritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_expenses: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_grant_received: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_other_sources: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub remainder: String,
}

/// Free-text answers from the bottom section of the report form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalQuestions {
    #[serde(default)]
    pub excess_expenses: String,
    #[serde(default)]
    pub surplus_use: String,
    #[serde(default)]
    pub lessons_learned: String,
    #[serde(default)]
    pub training_needs: String,
}

/// Top-level extraction result for one scanned form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredReport {
    #[serde(default)]
    pub err_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub expenses: Vec<ExpenseLineItem>,
    #[serde(default)]
    pub financial_summary: FinancialSummary,
    #[serde(default)]
    pub additional_questions: AdditionalQuestions,
}

/// Batch extraction wire shape: one completion covering every form
/// detected in a multi-form PDF.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportBatch {
    #[serde(default)]
    pub forms: Vec<StructuredReport>,
}

/// A reconciled report enriched with its project context and the public
/// URL of the uploaded source file — the shape handed to persistence.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedReport {
    #[serde(flatten)]
    pub report: StructuredReport,
    #[serde(rename = "projectMetadata")]
    pub project_metadata: ProjectMetadata,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Format a number the way the wire format expects: integers print
/// without a decimal point, everything else as the shortest float form.
pub(crate) fn format_wire_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Accept a JSON string, number, or null for a numeric-as-string field.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => format_wire_number(n),
        Raw::Null(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_amount_accepts_string() {
        let item: ExpenseLineItem =
            serde_json::from_str(r#"{"activity":"Water","amount":"150"}"#).unwrap();
        assert_eq!(item.amount, "150");
        assert_eq!(item.activity, "Water");
    }

    #[test]
    fn expense_amount_accepts_number() {
        let item: ExpenseLineItem = serde_json::from_str(r#"{"amount":150}"#).unwrap();
        assert_eq!(item.amount, "150");

        let item: ExpenseLineItem = serde_json::from_str(r#"{"amount":12.5}"#).unwrap();
        assert_eq!(item.amount, "12.5");
    }

    #[test]
    fn expense_amount_accepts_null() {
        let item: ExpenseLineItem = serde_json::from_str(r#"{"amount":null}"#).unwrap();
        assert_eq!(item.amount, "");
    }

    #[test]
    fn report_defaults_missing_sections() {
        let report: StructuredReport = serde_json::from_str(r#"{"err_id":"ERR-123"}"#).unwrap();
        assert_eq!(report.err_id, "ERR-123");
        assert!(report.expenses.is_empty());
        assert_eq!(report.financial_summary.total_expenses, "");
        assert_eq!(report.additional_questions.lessons_learned, "");
    }

    #[test]
    fn batch_parses_forms_array() {
        let batch: ReportBatch = serde_json::from_str(
            r#"{"forms":[{"err_id":"A"},{"err_id":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.forms.len(), 2);
        assert_eq!(batch.forms[1].err_id, "B");
    }

    #[test]
    fn enriched_report_flattens_and_renames() {
        let enriched = EnrichedReport {
            report: StructuredReport {
                err_id: "ERR-7".into(),
                ..Default::default()
            },
            project_metadata: ProjectMetadata::default(),
            file_url: "https://example.org/f.jpg".into(),
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["err_id"], "ERR-7");
        assert_eq!(value["fileUrl"], "https://example.org/f.jpg");
        assert!(value.get("projectMetadata").is_some());
    }

    #[test]
    fn wire_number_formatting() {
        assert_eq!(format_wire_number(200.0), "200");
        assert_eq!(format_wire_number(50.5), "50.5");
        assert_eq!(format_wire_number(0.0), "0");
        assert_eq!(format_wire_number(-25.0), "-25");
    }
}
