use crate::error::{DispoError, Result};
use crate::log::ExecutionLog;
use crate::types::ExecutionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AutomationRule
// ---------------------------------------------------------------------------

/// A manually managed, template-scoped automation rule, distinct from the
/// phase-driven reconciler. Mutated on every execution (`last_run_*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub template_id: String,
    pub title: String,
    pub trigger: String,
    pub condition: String,
    pub lead_time_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_status: Option<ExecutionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Payload for [`AutomationRuleEngine::add_rule`]; the id is generated and
/// the rule starts active with no run history.
#[derive(Debug, Clone, Default)]
pub struct NewRule {
    pub template_id: String,
    pub title: String,
    pub trigger: String,
    pub condition: String,
    pub lead_time_days: i64,
    pub next_run: Option<DateTime<Utc>>,
    pub next_template_id: Option<String>,
    pub webhook: Option<String>,
    pub test_mode: bool,
}

// ---------------------------------------------------------------------------
// SimulationReport / TriggerOptions
// ---------------------------------------------------------------------------

/// Result of a dry run. Never an error: an unknown rule id reports
/// `success: false` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_task_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TriggerOptions {
    /// Restrict execution to these rule ids; `None` runs every active rule
    /// of the template.
    pub only_rules: Option<Vec<String>>,
    pub linked_item_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// TemplateDependency
// ---------------------------------------------------------------------------

/// Directed edge "completing `from` should cascade to `to`". The edge list
/// is append-only and queries are simple filters; cycles are not detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDependency {
    pub from_template_id: String,
    pub to_template_id: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// AutomationRuleEngine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AutomationRuleEngine {
    rules: Vec<AutomationRule>,
    dependencies: Vec<TemplateDependency>,
}

impl AutomationRuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------------
    // Rule CRUD
    // ---------------------------------------------------------------------------

    pub fn add_rule(&mut self, new_rule: NewRule) -> &AutomationRule {
        let rule = AutomationRule {
            id: Uuid::new_v4().to_string(),
            template_id: new_rule.template_id,
            title: new_rule.title,
            trigger: new_rule.trigger,
            condition: new_rule.condition,
            lead_time_days: new_rule.lead_time_days,
            next_run: new_rule.next_run,
            active: true,
            next_template_id: new_rule.next_template_id,
            webhook: new_rule.webhook,
            test_mode: new_rule.test_mode,
            last_run_status: None,
            last_run_at: None,
        };
        self.rules.push(rule);
        self.rules.last().expect("just pushed")
    }

    pub fn rule(&self, rule_id: &str) -> Option<&AutomationRule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    pub fn list(&self) -> &[AutomationRule] {
        &self.rules
    }

    pub fn rules_for_template(&self, template_id: &str) -> Vec<&AutomationRule> {
        self.rules
            .iter()
            .filter(|r| r.template_id == template_id)
            .collect()
    }

    pub fn toggle(&mut self, rule_id: &str, active: bool) -> Result<()> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| DispoError::RuleNotFound(rule_id.to_string()))?;
        rule.active = active;
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Simulation
    // ---------------------------------------------------------------------------

    /// Dry run: reports what a real trigger would do without mutating any
    /// state. Fails gracefully on unknown ids.
    pub fn simulate(&self, rule_id: &str) -> SimulationReport {
        let Some(rule) = self.rule(rule_id) else {
            return SimulationReport {
                success: false,
                message: format!("automation rule not found: {rule_id}"),
                simulated_task_id: None,
            };
        };

        let mut message = format!(
            "dry run: rule '{}' would execute for template '{}'",
            rule.title, rule.template_id
        );
        if !rule.active {
            message.push_str(" (currently inactive)");
        }

        let simulated_task_id = rule
            .test_mode
            .then(|| format!("simulated-{}", &rule.id[..8.min(rule.id.len())]));

        SimulationReport {
            success: true,
            message,
            simulated_task_id,
        }
    }

    // ---------------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------------

    /// Execute every active rule of `template_id` (optionally restricted by
    /// an allowlist) for a freshly instantiated task. Appends one audit
    /// entry per rule and stamps the rule's run metadata. Returns the fired
    /// rule ids.
    pub fn trigger_for_template(
        &mut self,
        template_id: &str,
        task_id: &str,
        options: &TriggerOptions,
        now: DateTime<Utc>,
        log: &ExecutionLog,
    ) -> Vec<String> {
        let mut fired = Vec::new();
        for rule in self
            .rules
            .iter_mut()
            .filter(|r| r.active && r.template_id == template_id)
        {
            if let Some(only) = &options.only_rules {
                if !only.iter().any(|id| id == &rule.id) {
                    continue;
                }
            }

            let mut message = format!("rule '{}' executed for task '{}'", rule.title, task_id);
            if !options.linked_item_ids.is_empty() {
                message.push_str(&format!(", items: {}", options.linked_item_ids.join(", ")));
            }
            if let Some(webhook) = &rule.webhook {
                message.push_str(&format!(", webhook: {webhook}"));
            }
            if let Some(next) = &rule.next_template_id {
                message.push_str(&format!(", follow-up template: {next}"));
            }

            log.record(&rule.id, template_id, ExecutionStatus::Success, now, message);
            rule.last_run_status = Some(ExecutionStatus::Success);
            rule.last_run_at = Some(now);
            info!(rule = %rule.id, template = %template_id, task = %task_id, "automation rule fired");
            fired.push(rule.id.clone());
        }
        fired
    }

    // ---------------------------------------------------------------------------
    // Dependency graph
    // ---------------------------------------------------------------------------

    pub fn add_dependency(
        &mut self,
        from_template_id: impl Into<String>,
        to_template_id: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.dependencies.push(TemplateDependency {
            from_template_id: from_template_id.into(),
            to_template_id: to_template_id.into(),
            description: description.into(),
        });
    }

    pub fn dependencies(&self) -> &[TemplateDependency] {
        &self.dependencies
    }

    pub fn dependents_of(&self, template_id: &str) -> Vec<&TemplateDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.from_template_id == template_id)
            .collect()
    }

    pub fn predecessors_of(&self, template_id: &str) -> Vec<&TemplateDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.to_template_id == template_id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
