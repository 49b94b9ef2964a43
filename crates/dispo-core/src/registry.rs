use crate::builtin;
use crate::condition::AutomationCondition;
use crate::error::{DispoError, Result};
use crate::template::BusinessTemplate;
use crate::types::TimelineReference;
use crate::window::PhaseWindow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(DispoError::InvalidSlug(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PhaseTemplateDefinition
// ---------------------------------------------------------------------------

/// Definition of one scheduling phase: when it is actionable (window +
/// timeline reference), whether task creation is automatic, which business
/// template it instantiates, and which conditions gate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTemplateDefinition {
    pub id: String,
    pub label: String,
    pub summary: String,
    pub timeline_reference: TimelineReference,
    pub auto_create: bool,
    pub window: PhaseWindow,
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<AutomationCondition>,
}

// ---------------------------------------------------------------------------
// PhaseTemplateRegistry
// ---------------------------------------------------------------------------

/// Holds the immutable built-in phase definitions, runtime custom ones, the
/// business templates they reference, and per-phase automation overrides.
#[derive(Debug)]
pub struct PhaseTemplateRegistry {
    builtins: Vec<PhaseTemplateDefinition>,
    customs: Vec<PhaseTemplateDefinition>,
    templates: BTreeMap<String, BusinessTemplate>,
    automation_overrides: HashMap<String, bool>,
}

impl PhaseTemplateRegistry {
    /// Registry seeded with the built-in phase catalog and its templates.
    pub fn new() -> Self {
        let mut registry = Self {
            builtins: builtin::builtin_definitions(),
            customs: Vec::new(),
            templates: BTreeMap::new(),
            automation_overrides: HashMap::new(),
        };
        for template in builtin::builtin_templates() {
            registry.register_template(template);
        }
        registry
    }

    // ---------------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------------

    pub fn get(&self, phase_id: &str) -> Option<&PhaseTemplateDefinition> {
        self.builtins
            .iter()
            .chain(self.customs.iter())
            .find(|d| d.id == phase_id)
    }

    /// Built-ins first, customs appended in insertion order.
    pub fn list_all(&self) -> Vec<&PhaseTemplateDefinition> {
        self.builtins.iter().chain(self.customs.iter()).collect()
    }

    pub fn is_builtin(&self, phase_id: &str) -> bool {
        self.builtins.iter().any(|d| d.id == phase_id)
    }

    pub fn template(&self, template_id: &str) -> Option<&BusinessTemplate> {
        self.templates.get(template_id)
    }

    pub fn list_templates(&self) -> Vec<&BusinessTemplate> {
        self.templates.values().collect()
    }

    // ---------------------------------------------------------------------------
    // Automation toggle
    // ---------------------------------------------------------------------------

    /// Defaults to the definition's `auto_create`; an override wins. Unknown
    /// phases are never enabled.
    pub fn is_automation_enabled(&self, phase_id: &str) -> bool {
        if let Some(&enabled) = self.automation_overrides.get(phase_id) {
            return enabled;
        }
        self.get(phase_id).map(|d| d.auto_create).unwrap_or(false)
    }

    pub fn set_automation_enabled(&mut self, phase_id: &str, enabled: bool) {
        self.automation_overrides
            .insert(phase_id.to_string(), enabled);
    }

    pub fn clear_automation_override(&mut self, phase_id: &str) {
        self.automation_overrides.remove(phase_id);
    }

    // ---------------------------------------------------------------------------
    // Template registration
    // ---------------------------------------------------------------------------

    /// Register (or replace) a business template. The template's own
    /// `template_tag` is appended to its tag set when missing; that tag is
    /// what tag-based task deduplication searches for later.
    pub fn register_template(&mut self, mut template: BusinessTemplate) {
        let tag = Self::template_tag(&template.id);
        if !template.tags.contains(&tag) {
            template.tags.push(tag);
        }
        self.templates.insert(template.id.clone(), template);
    }

    // ---------------------------------------------------------------------------
    // Custom definition CRUD
    // ---------------------------------------------------------------------------

    /// Add a custom phase definition. The id must be a fresh slug and the
    /// referenced template must already be registered.
    pub fn create(&mut self, definition: PhaseTemplateDefinition) -> Result<String> {
        validate_id(&definition.id)?;
        definition.window.validate()?;
        if self.get(&definition.id).is_some() {
            return Err(DispoError::PhaseExists(definition.id));
        }
        if !self.templates.contains_key(&definition.template_id) {
            return Err(DispoError::TemplateNotFound(definition.template_id));
        }
        let id = definition.id.clone();
        tracing::debug!(phase = %id, "registered custom phase definition");
        self.customs.push(definition);
        Ok(id)
    }

    pub fn update_window(
        &mut self,
        phase_id: &str,
        window: PhaseWindow,
        timeline_reference: TimelineReference,
    ) -> Result<()> {
        window.validate()?;
        let definition = self.custom_mut(phase_id)?;
        definition.window = window;
        definition.timeline_reference = timeline_reference;
        Ok(())
    }

    pub fn update_conditions(
        &mut self,
        phase_id: &str,
        conditions: Vec<AutomationCondition>,
    ) -> Result<()> {
        let definition = self.custom_mut(phase_id)?;
        definition.conditions = conditions;
        Ok(())
    }

    /// Remove a custom definition. Built-ins are immutable and deletion is
    /// rejected without touching the registry.
    pub fn delete(&mut self, phase_id: &str) -> Result<()> {
        if self.is_builtin(phase_id) {
            return Err(DispoError::BuiltinImmutable(phase_id.to_string()));
        }
        let before = self.customs.len();
        self.customs.retain(|d| d.id != phase_id);
        if self.customs.len() == before {
            return Err(DispoError::PhaseNotFound(phase_id.to_string()));
        }
        self.automation_overrides.remove(phase_id);
        tracing::debug!(phase = %phase_id, "deleted custom phase definition");
        Ok(())
    }

    fn custom_mut(&mut self, phase_id: &str) -> Result<&mut PhaseTemplateDefinition> {
        if self.is_builtin(phase_id) {
            return Err(DispoError::BuiltinImmutable(phase_id.to_string()));
        }
        self.customs
            .iter_mut()
            .find(|d| d.id == phase_id)
            .ok_or_else(|| DispoError::PhaseNotFound(phase_id.to_string()))
    }

    // ---------------------------------------------------------------------------
    // Tag derivation
    // ---------------------------------------------------------------------------

    // Tags are the only place dedup keys live, so these strings are part of
    // the public contract and must stay stable.

    pub fn template_tag(template_id: &str) -> String {
        format!("template:{template_id}")
    }

    pub fn phase_tag(phase_id: &str) -> String {
        format!("phase:{phase_id}")
    }

    pub fn phase_bucket_tag(phase_id: &str, bucket_key: &str) -> String {
        format!("phase:{phase_id}:{bucket_key}")
    }
}

impl Default for PhaseTemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BucketGranularity, WindowUnit};

    fn custom_definition(id: &str, template_id: &str) -> PhaseTemplateDefinition {
        PhaseTemplateDefinition {
            id: id.to_string(),
            label: "Custom".to_string(),
            summary: "A custom phase".to_string(),
            timeline_reference: TimelineReference::ServiceStart,
            auto_create: true,
            window: PhaseWindow::new(WindowUnit::Days, -14, -1, BucketGranularity::Day, "w"),
            template_id: template_id.to_string(),
            source_phase: None,
            conditions: Vec::new(),
        }
    }

    #[test]
    fn builtins_are_seeded_and_listed_first() {
        let registry = PhaseTemplateRegistry::new();
        assert!(registry.get("short_term").is_some());
        assert!(registry.get("annual_request").is_some());
        assert!(registry.is_builtin("ad_hoc"));

        let all = registry.list_all();
        assert!(all.len() >= 4);
        assert!(registry.is_builtin(&all[0].id));
    }

    #[test]
    fn builtin_templates_carry_their_template_tag() {
        let registry = PhaseTemplateRegistry::new();
        for definition in registry.list_all() {
            let template = registry.template(&definition.template_id).unwrap();
            assert!(
                template
                    .tags
                    .contains(&PhaseTemplateRegistry::template_tag(&template.id)),
                "template {} is missing its own tag",
                template.id
            );
        }
    }

    #[test]
    fn create_and_delete_custom() {
        let mut registry = PhaseTemplateRegistry::new();
        let id = registry
            .create(custom_definition("framework-check", "tpl-short-term-check"))
            .unwrap();
        assert_eq!(id, "framework-check");
        assert!(registry.get("framework-check").is_some());

        registry.delete("framework-check").unwrap();
        assert!(registry.get("framework-check").is_none());
    }

    #[test]
    fn create_rejects_duplicate_and_unknown_template() {
        let mut registry = PhaseTemplateRegistry::new();
        assert!(matches!(
            registry.create(custom_definition("short_term", "tpl-short-term-check")),
            Err(DispoError::PhaseExists(_))
        ));
        assert!(matches!(
            registry.create(custom_definition("new-phase", "tpl-ghost")),
            Err(DispoError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn create_rejects_invalid_window() {
        let mut registry = PhaseTemplateRegistry::new();
        let mut definition = custom_definition("bad-window", "tpl-short-term-check");
        definition.window.start = 5;
        definition.window.end = -5;
        assert!(matches!(
            registry.create(definition),
            Err(DispoError::InvalidWindow(_))
        ));
    }

    #[test]
    fn delete_builtin_is_rejected_and_registry_unchanged() {
        let mut registry = PhaseTemplateRegistry::new();
        let before = registry.list_all().len();

        assert!(matches!(
            registry.delete("short_term"),
            Err(DispoError::BuiltinImmutable(_))
        ));
        assert_eq!(registry.list_all().len(), before);
        assert!(registry.get("short_term").is_some());
    }

    #[test]
    fn update_builtin_is_rejected() {
        let mut registry = PhaseTemplateRegistry::new();
        let window = PhaseWindow::new(WindowUnit::Days, -5, -1, BucketGranularity::Day, "w");
        assert!(matches!(
            registry.update_window("short_term", window, TimelineReference::ServiceStart),
            Err(DispoError::BuiltinImmutable(_))
        ));
        assert!(matches!(
            registry.update_conditions("annual_request", Vec::new()),
            Err(DispoError::BuiltinImmutable(_))
        ));
    }

    #[test]
    fn update_custom_window_and_conditions() {
        let mut registry = PhaseTemplateRegistry::new();
        registry
            .create(custom_definition("framework-check", "tpl-short-term-check"))
            .unwrap();

        let window = PhaseWindow::new(WindowUnit::Weeks, -8, -2, BucketGranularity::Week, "w2");
        registry
            .update_window("framework-check", window.clone(), TimelineReference::OrderCreated)
            .unwrap();

        let definition = registry.get("framework-check").unwrap();
        assert_eq!(definition.window, window);
        assert_eq!(
            definition.timeline_reference,
            TimelineReference::OrderCreated
        );

        registry
            .update_conditions(
                "framework-check",
                vec![crate::condition::AutomationCondition::ItemKind {
                    mode: crate::condition::Equality::Equals,
                    value: "regular".to_string(),
                }],
            )
            .unwrap();
        assert_eq!(registry.get("framework-check").unwrap().conditions.len(), 1);
    }

    #[test]
    fn automation_override_wins_over_auto_create() {
        let mut registry = PhaseTemplateRegistry::new();
        assert!(registry.is_automation_enabled("short_term"));

        registry.set_automation_enabled("short_term", false);
        assert!(!registry.is_automation_enabled("short_term"));

        registry.clear_automation_override("short_term");
        assert!(registry.is_automation_enabled("short_term"));

        // Unknown phases are never enabled, override or not.
        assert!(!registry.is_automation_enabled("ghost"));
    }

    #[test]
    fn tag_derivation_is_stable() {
        assert_eq!(
            PhaseTemplateRegistry::template_tag("tpl-annual-request"),
            "template:tpl-annual-request"
        );
        assert_eq!(
            PhaseTemplateRegistry::phase_tag("short_term"),
            "phase:short_term"
        );
        assert_eq!(
            PhaseTemplateRegistry::phase_bucket_tag("short_term", "2025-01-08"),
            "phase:short_term:2025-01-08"
        );
    }

    #[test]
    fn id_validation() {
        for id in ["short_term", "ad-hoc", "a", "phase2"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
        for id in ["", "-leading", "trailing-", "UPPER", "has space"] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }
}
