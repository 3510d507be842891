use serde::{Deserialize, Serialize};

/// Substituted for metadata fields that the project record does not carry.
pub const NOT_PROVIDED: &str = "Not provided";

/// Project record fetched from storage — read-only input to prompt
/// building and reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub id: String,
    /// Identifier of the Emergency Response Room running the project.
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub project_objectives: Option<String>,
    #[serde(default)]
    pub intended_beneficiaries: Option<String>,
    #[serde(default)]
    pub planned_activities: Option<Vec<PlannedActivity>>,
    /// Budgeted expense lines; frequency × unit price summed over these
    /// yields the grant total.
    #[serde(default)]
    pub expenses: Vec<BudgetedExpense>,
}

/// One activity the project committed to in its funding application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannedActivity {
    #[serde(default, rename = "selectedOption")]
    pub selected_option: Option<String>,
    #[serde(default, rename = "placeOfOperation")]
    pub place_of_operation: Option<String>,
}

/// One budgeted expense line from the project's funding application.
/// Frequency and unit price arrive as strings or numbers depending on
/// how the record was authored; both are coerced at reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetedExpense {
    #[serde(default, deserialize_with = "super::report::lenient_string")]
    pub frequency: String,
    #[serde(default, rename = "unitPrice", deserialize_with = "super::report::lenient_string")]
    pub unit_price: String,
}

impl ProjectMetadata {
    /// Render planned activities as `"<activity> at <location>"` pairs
    /// joined by `", "`. Used both in prompts and as the backfill value
    /// for extracted expenses with no readable activity.
    pub fn planned_activities_summary(&self) -> String {
        let activities = match &self.planned_activities {
            Some(list) if !list.is_empty() => list,
            _ => return NOT_PROVIDED.to_string(),
        };

        activities
            .iter()
            .map(|a| {
                format!(
                    "{} at {}",
                    a.selected_option.as_deref().unwrap_or("Unknown"),
                    a.place_of_operation.as_deref().unwrap_or("Unknown location"),
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activities_summary_joins_pairs() {
        let metadata = ProjectMetadata {
            planned_activities: Some(vec![
                PlannedActivity {
                    selected_option: Some("Water distribution".into()),
                    place_of_operation: Some("Omdurman".into()),
                },
                PlannedActivity {
                    selected_option: Some("Communal kitchen".into()),
                    place_of_operation: None,
                },
            ]),
            ..Default::default()
        };
        assert_eq!(
            metadata.planned_activities_summary(),
            "Water distribution at Omdurman, Communal kitchen at Unknown location"
        );
    }

    #[test]
    fn activities_summary_not_provided_when_absent() {
        assert_eq!(
            ProjectMetadata::default().planned_activities_summary(),
            NOT_PROVIDED
        );
        let empty = ProjectMetadata {
            planned_activities: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(empty.planned_activities_summary(), NOT_PROVIDED);
    }

    #[test]
    fn budgeted_expense_accepts_numbers_and_strings() {
        let metadata: ProjectMetadata = serde_json::from_str(
            r#"{"id":"p1","expenses":[{"frequency":2,"unitPrice":"100"}]}"#,
        )
        .unwrap();
        assert_eq!(metadata.expenses[0].frequency, "2");
        assert_eq!(metadata.expenses[0].unit_price, "100");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let metadata: ProjectMetadata = serde_json::from_str(
            r#"{"id":"p1","state":"Khartoum","submitted_at":"2024-06-01"}"#,
        )
        .unwrap();
        assert_eq!(metadata.id, "p1");
    }
}
