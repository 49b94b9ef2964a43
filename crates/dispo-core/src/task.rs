use crate::types::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BusinessTask
// ---------------------------------------------------------------------------

/// The unit of follow-up work created or linked by the engine. Owned by the
/// business-task collaborator; this is the shape the engine reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub assignment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub linked_item_ids: Vec<String>,
}

impl BusinessTask {
    /// Link an item. Returns `false` if already linked (idempotent).
    pub fn link_item(&mut self, item_id: &str) -> bool {
        if self.linked_item_ids.iter().any(|id| id == item_id) {
            return false;
        }
        self.linked_item_ids.push(item_id.to_string());
        true
    }

    /// Whether this task carries every tag in `tags` (exact match).
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

// ---------------------------------------------------------------------------
// TaskDraft
// ---------------------------------------------------------------------------

/// Creation payload handed to the task collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub assignment: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub linked_item_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Human-readable summary: "2/5 done, 1 in progress"
pub fn summarize(tasks: &[BusinessTask]) -> String {
    let total = tasks.len();
    let done = tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::Done))
        .count();
    let in_progress = tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::InProgress))
        .count();
    format!("{done}/{total} done, {in_progress} in progress")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> BusinessTask {
        BusinessTask {
            id: "task-1".to_string(),
            title: "Check path request".to_string(),
            description: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            due_date: None,
            status: TaskStatus::Open,
            assignment: "planning".to_string(),
            tags: vec!["phase:short_term".to_string(), "phase:short_term:2025-01-08".to_string()],
            linked_item_ids: vec![],
        }
    }

    #[test]
    fn link_item_is_idempotent() {
        let mut t = task();
        assert!(t.link_item("it-1"));
        assert!(!t.link_item("it-1"));
        assert_eq!(t.linked_item_ids, vec!["it-1"]);
    }

    #[test]
    fn tag_pair_lookup() {
        let t = task();
        let both = vec![
            "phase:short_term".to_string(),
            "phase:short_term:2025-01-08".to_string(),
        ];
        let wrong = vec![
            "phase:short_term".to_string(),
            "phase:short_term:2025-01-09".to_string(),
        ];
        assert!(t.has_all_tags(&both));
        assert!(!t.has_all_tags(&wrong));
        assert!(t.has_all_tags(&[]));
    }

    #[test]
    fn summary_counts() {
        let mut a = task();
        a.status = TaskStatus::Done;
        let b = task();
        assert_eq!(summarize(&[a, b]), "1/2 done, 0 in progress");
    }
}
