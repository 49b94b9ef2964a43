use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel phase id emitted by upstream snapshots when an item's phase
/// cannot be determined. Transitions into it are ignored, never recorded.
pub const UNKNOWN_PHASE: &str = "unknown";

// ---------------------------------------------------------------------------
// WindowUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
    Hours,
    Days,
    Weeks,
}

impl WindowUnit {
    pub fn minutes_per(self) -> i64 {
        match self {
            WindowUnit::Hours => 60,
            WindowUnit::Days => 1_440,
            WindowUnit::Weeks => 10_080,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowUnit::Hours => "hours",
            WindowUnit::Days => "days",
            WindowUnit::Weeks => "weeks",
        }
    }
}

impl fmt::Display for WindowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BucketGranularity
// ---------------------------------------------------------------------------

/// Time granularity used to group items into one shared business task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketGranularity {
    Hour,
    Day,
    Week,
    Year,
}

impl BucketGranularity {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketGranularity::Hour => "hour",
            BucketGranularity::Day => "day",
            BucketGranularity::Week => "week",
            BucketGranularity::Year => "year",
        }
    }
}

impl fmt::Display for BucketGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TimelineReference
// ---------------------------------------------------------------------------

/// Named anchor date on an order item that window offsets are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineReference {
    /// First scheduled day of service for the item.
    ServiceStart,
    /// The timetable change date the item is planned against.
    TimetableChange,
    /// When the order line item was created.
    OrderCreated,
}

impl TimelineReference {
    pub fn all() -> &'static [TimelineReference] {
        &[
            TimelineReference::ServiceStart,
            TimelineReference::TimetableChange,
            TimelineReference::OrderCreated,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimelineReference::ServiceStart => "service_start",
            TimelineReference::TimetableChange => "timetable_change",
            TimelineReference::OrderCreated => "order_created",
        }
    }
}

impl fmt::Display for TimelineReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimelineReference {
    type Err = crate::error::DispoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service_start" => Ok(TimelineReference::ServiceStart),
            "timetable_change" => Ok(TimelineReference::TimetableChange),
            "order_created" => Ok(TimelineReference::OrderCreated),
            _ => Err(crate::error::DispoError::InvalidTimelineReference(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Warning => "warning",
            ExecutionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a business task. The engine only ever creates tasks as `Open`;
/// the remaining states belong to the task collaborator's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
