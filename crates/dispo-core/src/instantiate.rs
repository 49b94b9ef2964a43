use crate::error::{DispoError, Result};
use crate::registry::PhaseTemplateRegistry;
use crate::store::TaskStore;
use crate::task::{BusinessTask, TaskDraft};
use crate::template::DueAnchor;
use chrono::{DateTime, Duration, Utc};

// ---------------------------------------------------------------------------
// InstantiateContext
// ---------------------------------------------------------------------------

/// Caller-supplied context for turning a template into a task.
#[derive(Debug, Clone)]
pub struct InstantiateContext {
    pub target_date: Option<DateTime<Utc>>,
    pub custom_title: Option<String>,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub linked_item_ids: Vec<String>,
    /// The instantiation instant; injected for deterministic due dates.
    pub now: DateTime<Utc>,
}

impl InstantiateContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            target_date: None,
            custom_title: None,
            note: None,
            tags: Vec::new(),
            linked_item_ids: Vec::new(),
            now,
        }
    }
}

// ---------------------------------------------------------------------------
// Instantiation
// ---------------------------------------------------------------------------

/// Turn a registered template plus context into a persisted business task.
pub fn instantiate(
    registry: &PhaseTemplateRegistry,
    tasks: &mut dyn TaskStore,
    template_id: &str,
    ctx: InstantiateContext,
) -> Result<BusinessTask> {
    let template = registry
        .template(template_id)
        .ok_or_else(|| DispoError::TemplateNotFound(template_id.to_string()))?;

    let due_base = match template.due_rule.anchor {
        DueAnchor::TargetDate => ctx.target_date.unwrap_or(ctx.now),
        DueAnchor::Creation => ctx.now,
    };
    let due_date = due_base + Duration::days(template.due_rule.offset_days);

    let title = match ctx.custom_title.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => template.title.clone(),
    };

    let mut description = template.description.clone();
    if let Some(note) = ctx.note.as_deref().map(str::trim) {
        if !note.is_empty() {
            description.push_str("\n\nNote:\n");
            description.push_str(note);
        }
    }

    let mut tags = template.tags.clone();
    for tag in ctx.tags {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let task = tasks.create(TaskDraft {
        title,
        description,
        created_at: ctx.now,
        due_date: Some(due_date),
        assignment: template.recommended_assignment.clone(),
        tags,
        linked_item_ids: ctx.linked_item_ids,
    });
    tracing::info!(template = %template_id, task = %task.id, "instantiated business task");
    Ok(task)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
