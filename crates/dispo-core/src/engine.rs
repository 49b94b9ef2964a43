use crate::config::AutomationConfig;
use crate::error::Result;
use crate::instantiate::InstantiateContext;
use crate::log::ExecutionLog;
use crate::reconciler::{AutomationReconciler, PhaseSnapshot, ReconcileOutcome};
use crate::registry::PhaseTemplateRegistry;
use crate::rules::{AutomationRuleEngine, TriggerOptions};
use crate::store::{ItemDirectory, TaskStore};
use crate::task::BusinessTask;
use tracing::debug;

// ---------------------------------------------------------------------------
// AutomationEngine
// ---------------------------------------------------------------------------

/// Explicit engine instance wiring registry, reconciler, rule engine and
/// audit log around injected collaborators. The host invokes
/// [`reconcile_once`](Self::reconcile_once) whenever it decides the phase
/// snapshot changed; the engine owns no scheduling policy of its own.
pub struct AutomationEngine {
    config: AutomationConfig,
    registry: PhaseTemplateRegistry,
    rules: AutomationRuleEngine,
    log: ExecutionLog,
    reconciler: AutomationReconciler,
    items: Box<dyn ItemDirectory>,
    tasks: Box<dyn TaskStore>,
}

impl AutomationEngine {
    pub fn new(items: Box<dyn ItemDirectory>, tasks: Box<dyn TaskStore>) -> Self {
        Self::with_config(AutomationConfig::default(), items, tasks)
    }

    pub fn with_config(
        config: AutomationConfig,
        items: Box<dyn ItemDirectory>,
        tasks: Box<dyn TaskStore>,
    ) -> Self {
        let mut registry = PhaseTemplateRegistry::new();
        for phase in &config.disabled_phases {
            registry.set_automation_enabled(phase, false);
        }
        Self {
            log: ExecutionLog::with_capacity(config.log_capacity),
            config,
            registry,
            rules: AutomationRuleEngine::new(),
            reconciler: AutomationReconciler::new(),
            items,
            tasks,
        }
    }

    // ---------------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------------

    /// Process the current snapshot. The host owns the invalidation policy;
    /// see [`PhaseSnapshot`] for the evaluation-instant contract.
    pub fn reconcile_once(&mut self, snapshot: &PhaseSnapshot) -> ReconcileOutcome {
        if !self.config.automation_enabled {
            debug!("automation disabled by config, snapshot ignored");
            return ReconcileOutcome::default();
        }
        self.reconciler.reconcile_once(
            snapshot,
            &self.registry,
            self.items.as_ref(),
            self.tasks.as_mut(),
            &mut self.rules,
            &self.log,
        )
    }

    /// Manual "create from template". Unlike the reconciler's automatic
    /// path, errors propagate to the caller for user-facing reporting.
    pub fn instantiate(
        &mut self,
        template_id: &str,
        ctx: InstantiateContext,
    ) -> Result<BusinessTask> {
        let now = ctx.now;
        let linked_item_ids = ctx.linked_item_ids.clone();
        let task =
            crate::instantiate::instantiate(&self.registry, self.tasks.as_mut(), template_id, ctx)?;
        self.rules.trigger_for_template(
            template_id,
            &task.id,
            &TriggerOptions {
                only_rules: None,
                linked_item_ids,
            },
            now,
            &self.log,
        );
        Ok(task)
    }

    // ---------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    pub fn registry(&self) -> &PhaseTemplateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PhaseTemplateRegistry {
        &mut self.registry
    }

    pub fn rules(&self) -> &AutomationRuleEngine {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut AutomationRuleEngine {
        &mut self.rules
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub fn tasks(&self) -> &dyn TaskStore {
        self.tasks.as_ref()
    }

    pub fn items(&self) -> &dyn ItemDirectory {
        self.items.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::error::DispoError;
    use crate::item::OrderItem;
    use crate::store::{MemoryItemDirectory, MemoryTaskStore};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn taken_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn engine_with_items(items: Vec<OrderItem>) -> AutomationEngine {
        let mut directory = MemoryItemDirectory::new();
        for item in items {
            directory.insert(item);
        }
        AutomationEngine::new(Box::new(directory), Box::new(MemoryTaskStore::new()))
    }

    fn short_term_item(id: &str, days_ago: i64) -> OrderItem {
        let mut item = OrderItem::new(id, "regular");
        item.service_start = Some(taken_at() - Duration::days(days_ago));
        item
    }

    #[test]
    fn end_to_end_snapshot_to_task() {
        let mut engine = engine_with_items(vec![short_term_item("it-1", 10)]);

        let mut snapshot = PhaseSnapshot::at(taken_at());
        snapshot.set("it-1", builtin::SHORT_TERM);
        let outcome = engine.reconcile_once(&snapshot);

        assert_eq!(outcome.created, 1);
        assert_eq!(engine.tasks().list().len(), 1);
        assert_eq!(engine.log().len(), 1);
    }

    #[test]
    fn config_master_switch_ignores_snapshots() {
        let mut config = AutomationConfig::default();
        config.automation_enabled = false;

        let mut directory = MemoryItemDirectory::new();
        directory.insert(short_term_item("it-1", 10));
        let mut engine = AutomationEngine::with_config(
            config,
            Box::new(directory),
            Box::new(MemoryTaskStore::new()),
        );

        let mut snapshot = PhaseSnapshot::at(taken_at());
        snapshot.set("it-1", builtin::SHORT_TERM);
        assert_eq!(engine.reconcile_once(&snapshot), ReconcileOutcome::default());
        assert!(engine.tasks().list().is_empty());
    }

    #[test]
    fn config_disabled_phases_become_overrides() {
        let mut config = AutomationConfig::default();
        config.disabled_phases.push(builtin::SHORT_TERM.to_string());

        let mut directory = MemoryItemDirectory::new();
        directory.insert(short_term_item("it-1", 10));
        let mut engine = AutomationEngine::with_config(
            config,
            Box::new(directory),
            Box::new(MemoryTaskStore::new()),
        );

        let mut snapshot = PhaseSnapshot::at(taken_at());
        snapshot.set("it-1", builtin::SHORT_TERM);
        let outcome = engine.reconcile_once(&snapshot);
        assert_eq!(outcome.skipped, 1);
        assert!(engine.tasks().list().is_empty());
    }

    #[test]
    fn config_log_capacity_is_applied() {
        let mut config = AutomationConfig::default();
        config.log_capacity = 5;
        let engine = AutomationEngine::with_config(
            config,
            Box::new(MemoryItemDirectory::new()),
            Box::new(MemoryTaskStore::new()),
        );
        assert_eq!(engine.log().capacity(), 5);
    }

    #[test]
    fn manual_instantiate_propagates_not_found() {
        let mut engine = engine_with_items(vec![]);
        let err = engine
            .instantiate("tpl-ghost", InstantiateContext::at(taken_at()))
            .unwrap_err();
        assert!(matches!(err, DispoError::TemplateNotFound(_)));
    }

    #[test]
    fn manual_instantiate_fires_rules() {
        use crate::rules::NewRule;

        let mut engine = engine_with_items(vec![]);
        engine.rules_mut().add_rule(NewRule {
            template_id: "tpl-annual-request".to_string(),
            title: "notify".to_string(),
            trigger: "manual".to_string(),
            ..NewRule::default()
        });

        let task = engine
            .instantiate("tpl-annual-request", InstantiateContext::at(taken_at()))
            .unwrap();
        assert_eq!(engine.log().len(), 1);
        assert!(engine.log().snapshot()[0].message.contains(&task.id));
    }
}
