use crate::error::{DispoError, Result};
use crate::item::OrderItem;
use crate::task::{BusinessTask, TaskDraft};
use crate::types::{TaskStatus, TimelineReference};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Collaborator interfaces
// ---------------------------------------------------------------------------

/// Read access to order items and their anchor dates. The default methods
/// answer straight from the item view; a host may override them when the
/// data lives elsewhere (e.g. a timetable join).
pub trait ItemDirectory {
    fn item(&self, item_id: &str) -> Option<OrderItem>;

    fn reference_date(
        &self,
        item: &OrderItem,
        reference: TimelineReference,
    ) -> Option<DateTime<Utc>> {
        item.reference_date(reference)
    }

    fn timetable_year(&self, item: &OrderItem) -> Option<String> {
        item.timetable_year.clone()
    }
}

/// Create/read/link access to business tasks.
pub trait TaskStore {
    fn create(&mut self, draft: TaskDraft) -> BusinessTask;

    fn get(&self, task_id: &str) -> Option<BusinessTask>;

    /// First task carrying ALL of `tags` (linear scan; tags are the dedup
    /// source of truth).
    fn find_by_tags(&self, tags: &[String]) -> Option<BusinessTask>;

    fn set_linked_items(&mut self, task_id: &str, item_ids: Vec<String>) -> Result<()>;

    fn list(&self) -> Vec<BusinessTask>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory item directory for development and testing.
#[derive(Debug, Default)]
pub struct MemoryItemDirectory {
    items: HashMap<String, OrderItem>,
}

impl MemoryItemDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: OrderItem) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemDirectory for MemoryItemDirectory {
    fn item(&self, item_id: &str) -> Option<OrderItem> {
        self.items.get(item_id).cloned()
    }
}

/// In-memory task store for development and testing. Ids are sequential
/// (`task-1`, `task-2`, ...) so tests stay deterministic.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Vec<BusinessTask>,
    next_id: usize,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&mut self, draft: TaskDraft) -> BusinessTask {
        self.next_id += 1;
        let task = BusinessTask {
            id: format!("task-{}", self.next_id),
            title: draft.title,
            description: draft.description,
            created_at: draft.created_at,
            due_date: draft.due_date,
            status: TaskStatus::Open,
            assignment: draft.assignment,
            tags: draft.tags,
            linked_item_ids: draft.linked_item_ids,
        };
        self.tasks.push(task.clone());
        task
    }

    fn get(&self, task_id: &str) -> Option<BusinessTask> {
        self.tasks.iter().find(|t| t.id == task_id).cloned()
    }

    fn find_by_tags(&self, tags: &[String]) -> Option<BusinessTask> {
        self.tasks.iter().find(|t| t.has_all_tags(tags)).cloned()
    }

    fn set_linked_items(&mut self, task_id: &str, item_ids: Vec<String>) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| DispoError::TaskNotFound(task_id.to_string()))?;
        task.linked_item_ids = item_ids;
        Ok(())
    }

    fn list(&self) -> Vec<BusinessTask> {
        self.tasks.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
