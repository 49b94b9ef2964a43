use crate::types::ExecutionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Most recent entries retained; the oldest are evicted first.
pub const DEFAULT_LOG_CAPACITY: usize = 200;

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Append-only audit record of one automation execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub rule_id: String,
    pub template_id: String,
    pub status: ExecutionStatus,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ExecutionLog
// ---------------------------------------------------------------------------

/// Bounded audit log. Readers take an immutable snapshot; the writer builds
/// the next vector and swaps it in atomically, so a snapshot never observes
/// a half-applied append.
#[derive(Debug)]
pub struct ExecutionLog {
    entries: RwLock<Arc<Vec<Execution>>>,
    capacity: usize,
    next_seq: AtomicU64,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            capacity: capacity.max(1),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting the oldest once the cap is reached.
    pub fn record(
        &self,
        rule_id: impl Into<String>,
        template_id: impl Into<String>,
        status: ExecutionStatus,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Execution {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = Execution {
            id: format!("exec-{seq}"),
            rule_id: rule_id.into(),
            template_id: template_id.into(),
            status,
            timestamp,
            message: message.into(),
        };

        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<Execution> = guard.as_ref().clone();
        next.push(entry.clone());
        if next.len() > self.capacity {
            let overflow = next.len() - self.capacity;
            next.drain(..overflow);
        }
        *guard = Arc::new(next);
        entry
    }

    /// Immutable snapshot of the current entries, oldest first.
    pub fn snapshot(&self) -> Arc<Vec<Execution>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<Execution> {
        let snapshot = self.snapshot();
        snapshot.iter().rev().take(n).cloned().collect()
    }

    pub fn for_rule(&self, rule_id: &str) -> Vec<Execution> {
        self.snapshot()
            .iter()
            .filter(|e| e.rule_id == rule_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Default for ExecutionLog {
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
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn record_appends_with_sequential_ids() {
        let log = ExecutionLog::new();
        let a = log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), "one");
        let b = log.record("r1", "tpl-a", ExecutionStatus::Warning, ts(), "two");
        assert_eq!(a.id, "exec-1");
        assert_eq!(b.id, "exec-2");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn fifo_eviction_at_capacity() {
        let log = ExecutionLog::with_capacity(3);
        for i in 1..=5 {
            log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), format!("m{i}"));
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].message, "m3");
        assert_eq!(snapshot[2].message, "m5");
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let log = ExecutionLog::new();
        log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), "one");
        let before = log.snapshot();
        log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), "two");
        assert_eq!(before.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn recent_is_newest_first() {
        let log = ExecutionLog::new();
        log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), "one");
        log.record("r2", "tpl-a", ExecutionStatus::Success, ts(), "two");
        let recent = log.recent(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "two");
    }

    #[test]
    fn filter_by_rule() {
        let log = ExecutionLog::new();
        log.record("r1", "tpl-a", ExecutionStatus::Success, ts(), "one");
        log.record("r2", "tpl-b", ExecutionStatus::Error, ts(), "two");
        assert_eq!(log.for_rule("r2").len(), 1);
        assert_eq!(log.for_rule("ghost").len(), 0);
    }
}
