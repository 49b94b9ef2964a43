use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DueRule
// ---------------------------------------------------------------------------

/// Which date the due-date offset counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueAnchor {
    /// The target date handed to the instantiator (falls back to "now"
    /// when the caller provides none).
    TargetDate,
    /// The moment of instantiation.
    Creation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueRule {
    pub anchor: DueAnchor,
    /// Calendar-day offset, may be negative.
    pub offset_days: i64,
    pub label: String,
}

impl DueRule {
    pub fn target_plus(offset_days: i64, label: impl Into<String>) -> Self {
        Self {
            anchor: DueAnchor::TargetDate,
            offset_days,
            label: label.into(),
        }
    }

    pub fn creation_plus(offset_days: i64, label: impl Into<String>) -> Self {
        Self {
            anchor: DueAnchor::Creation,
            offset_days,
            label: label.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStep {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl TemplateStep {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BusinessTemplate
// ---------------------------------------------------------------------------

/// Reusable blueprint for a business task: title, description, assignment,
/// tag set and due-date rule. Owned by the registry, referenced by id from
/// phase definitions and automation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    pub recommended_assignment: String,
    pub due_rule: DueRule,
    #[serde(default)]
    pub default_lead_time_days: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TemplateStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_hints: Vec<String>,
}

impl BusinessTemplate {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        recommended_assignment: impl Into<String>,
        due_rule: DueRule,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            instructions: None,
            tags: Vec::new(),
            category: category.into(),
            recommended_assignment: recommended_assignment.into(),
            due_rule,
            default_lead_time_days: 0,
            steps: Vec::new(),
            parameter_hints: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_rule_constructors() {
        let r = DueRule::target_plus(30, "one month after request");
        assert_eq!(r.anchor, DueAnchor::TargetDate);
        assert_eq!(r.offset_days, 30);

        let r = DueRule::creation_plus(-7, "a week before creation");
        assert_eq!(r.anchor, DueAnchor::Creation);
        assert_eq!(r.offset_days, -7);
    }

    #[test]
    fn template_serde_roundtrip() {
        let mut t = BusinessTemplate::new(
            "tpl-check",
            "Run plausibility check",
            "Check the order line item against the current timetable.",
            "planning",
            "capacity-team",
            DueRule::target_plus(14, "two weeks"),
        );
        t.tags.push("template:tpl-check".to_string());
        t.steps.push(TemplateStep::new("Pull current timetable"));

        let json = serde_json::to_string(&t).unwrap();
        let back: BusinessTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "tpl-check");
        assert_eq!(back.steps.len(), 1);
        assert!(!back.steps[0].done);
    }
}
