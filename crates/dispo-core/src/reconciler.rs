use crate::bucket::bucket_key;
use crate::condition::passes;
use crate::error::Result;
use crate::instantiate::{instantiate, InstantiateContext};
use crate::log::ExecutionLog;
use crate::registry::PhaseTemplateRegistry;
use crate::rules::{AutomationRuleEngine, TriggerOptions};
use crate::store::{ItemDirectory, TaskStore};
use crate::types::{ExecutionStatus, UNKNOWN_PHASE};
use crate::window::is_within_window;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// PhaseSnapshot
// ---------------------------------------------------------------------------

/// The host-computed "current phase per item" signal. Windows and buckets
/// are evaluated against `taken_at`, the instant the snapshot was taken:
/// nothing re-arms between snapshots, so an item whose window opens and
/// closes between two host invocations is never picked up. That is the
/// contract, not a timer waiting to be added.
#[derive(Debug, Clone)]
pub struct PhaseSnapshot {
    pub phases: BTreeMap<String, String>,
    pub taken_at: DateTime<Utc>,
}

impl PhaseSnapshot {
    pub fn at(taken_at: DateTime<Utc>) -> Self {
        Self {
            phases: BTreeMap::new(),
            taken_at,
        }
    }

    pub fn set(&mut self, item_id: impl Into<String>, phase_id: impl Into<String>) {
        self.phases.insert(item_id.into(), phase_id.into());
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Items whose phase actually changed this pass.
    pub processed: usize,
    pub created: usize,
    pub attached: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    UnknownPhase,
    Disabled,
    MissingItem,
    MissingReferenceDate,
    OutsideWindow,
    ConditionFailed,
}

enum Disposition {
    Created,
    Attached,
    Skipped(SkipReason),
}

// ---------------------------------------------------------------------------
// AutomationReconciler
// ---------------------------------------------------------------------------

/// Edge-triggered orchestrator. Remembers the last observed phase per item
/// and acts only on changes; the memory is process-local and starts empty,
/// so a cold start re-evaluates every item once (an intentional re-seed).
#[derive(Debug, Default)]
pub struct AutomationReconciler {
    last_phase: HashMap<String, String>,
    reconciling: bool,
}

impl AutomationReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last phase recorded for an item, if any.
    pub fn last_phase(&self, item_id: &str) -> Option<&str> {
        self.last_phase.get(item_id).map(String::as_str)
    }

    /// Process one snapshot synchronously to completion. Passes never
    /// interleave: a re-entrant call is refused whole, preserving the
    /// at-most-once-per-change guarantee.
    pub fn reconcile_once(
        &mut self,
        snapshot: &PhaseSnapshot,
        registry: &PhaseTemplateRegistry,
        items: &dyn ItemDirectory,
        tasks: &mut dyn TaskStore,
        rules: &mut AutomationRuleEngine,
        log: &ExecutionLog,
    ) -> ReconcileOutcome {
        if self.reconciling {
            warn!("reconcile pass refused: another pass is still running");
            return ReconcileOutcome::default();
        }
        self.reconciling = true;

        let mut outcome = ReconcileOutcome::default();
        for (item_id, phase_id) in &snapshot.phases {
            // Sentinel transitions are ignored and never recorded.
            if phase_id == UNKNOWN_PHASE {
                continue;
            }
            if self.last_phase.get(item_id) == Some(phase_id) {
                continue;
            }
            self.last_phase
                .insert(item_id.clone(), phase_id.clone());
            outcome.processed += 1;

            match process_item(item_id, phase_id, snapshot.taken_at, registry, items, tasks, rules, log)
            {
                Ok(Disposition::Created) => outcome.created += 1,
                Ok(Disposition::Attached) => outcome.attached += 1,
                Ok(Disposition::Skipped(reason)) => {
                    outcome.skipped += 1;
                    debug!(item = %item_id, phase = %phase_id, ?reason, "automation skipped");
                }
                Err(err) => {
                    // One item's failure never aborts the batch.
                    outcome.failed += 1;
                    warn!(item = %item_id, phase = %phase_id, %err, "automation failed");
                    let template_id = registry
                        .get(phase_id)
                        .map(|d| d.template_id.clone())
                        .unwrap_or_default();
                    log.record(
                        phase_id,
                        template_id,
                        ExecutionStatus::Error,
                        snapshot.taken_at,
                        format!("item '{item_id}': {err}"),
                    );
                }
            }
        }

        self.reconciling = false;
        outcome
    }
}

// ---------------------------------------------------------------------------
// Per-item processing
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn process_item(
    item_id: &str,
    phase_id: &str,
    taken_at: DateTime<Utc>,
    registry: &PhaseTemplateRegistry,
    items: &dyn ItemDirectory,
    tasks: &mut dyn TaskStore,
    rules: &mut AutomationRuleEngine,
    log: &ExecutionLog,
) -> Result<Disposition> {
    let Some(definition) = registry.get(phase_id) else {
        return Ok(Disposition::Skipped(SkipReason::UnknownPhase));
    };
    if !registry.is_automation_enabled(phase_id) {
        return Ok(Disposition::Skipped(SkipReason::Disabled));
    }
    let Some(mut item) = items.item(item_id) else {
        return Ok(Disposition::Skipped(SkipReason::MissingItem));
    };
    if item.timetable_year.is_none() {
        // Directories backed by a timetable join can supply the year label
        // even when the item view lacks one.
        item.timetable_year = items.timetable_year(&item);
    }
    let Some(reference) = items.reference_date(&item, definition.timeline_reference) else {
        return Ok(Disposition::Skipped(SkipReason::MissingReferenceDate));
    };
    if !is_within_window(&definition.window, reference, taken_at) {
        return Ok(Disposition::Skipped(SkipReason::OutsideWindow));
    }
    if !passes(&definition.conditions, &item, phase_id) {
        return Ok(Disposition::Skipped(SkipReason::ConditionFailed));
    }

    let key = bucket_key(definition, reference, &item);
    let template_tag = PhaseTemplateRegistry::template_tag(&definition.template_id);
    let bucket_tag = PhaseTemplateRegistry::phase_bucket_tag(phase_id, &key);

    if let Some(mut task) = tasks.find_by_tags(&[template_tag, bucket_tag.clone()]) {
        if task.link_item(item_id) {
            tasks.set_linked_items(&task.id, task.linked_item_ids.clone())?;
        }
        log.record(
            phase_id,
            &definition.template_id,
            ExecutionStatus::Success,
            taken_at,
            format!("attached item '{item_id}' to task '{}'", task.id),
        );
        info!(item = %item_id, task = %task.id, "attached item to existing task");
        return Ok(Disposition::Attached);
    }

    let template_title = registry
        .template(&definition.template_id)
        .map(|t| t.title.clone())
        .unwrap_or_else(|| definition.label.clone());

    let mut ctx = InstantiateContext::at(taken_at);
    ctx.target_date = Some(reference);
    ctx.custom_title = Some(format!("{} · {}", template_title, definition.label));
    ctx.tags = vec![PhaseTemplateRegistry::phase_tag(phase_id), bucket_tag.clone()];
    ctx.linked_item_ids = vec![item_id.to_string()];

    let task = instantiate(registry, tasks, &definition.template_id, ctx)?;
    log.record(
        phase_id,
        &definition.template_id,
        ExecutionStatus::Success,
        taken_at,
        format!("created task '{}' for bucket '{bucket_tag}'", task.id),
    );
    rules.trigger_for_template(
        &definition.template_id,
        &task.id,
        &TriggerOptions {
            only_rules: None,
            linked_item_ids: vec![item_id.to_string()],
        },
        taken_at,
        log,
    );
    info!(item = %item_id, task = %task.id, phase = %phase_id, "created task from phase entry");
    Ok(Disposition::Created)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
