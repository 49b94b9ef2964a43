use crate::types::TimelineReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderItem
// ---------------------------------------------------------------------------

/// Read view of a transport-order line item, as exposed by the item
/// repository collaborator. The engine never mutates items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    /// Item kind, e.g. "regular", "special", "empty_run".
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Timetable-year label the item is ordered for, e.g. "2025".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_year: Option<String>,
    /// Secondary phase attribute maintained by the timetable side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_change: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_created: Option<DateTime<Utc>>,
}

impl OrderItem {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            tags: Vec::new(),
            timetable_year: None,
            timetable_phase: None,
            service_start: None,
            timetable_change: None,
            order_created: None,
        }
    }

    /// The anchor date for `reference`, if the item carries one.
    pub fn reference_date(&self, reference: TimelineReference) -> Option<DateTime<Utc>> {
        match reference {
            TimelineReference::ServiceStart => self.service_start,
            TimelineReference::TimetableChange => self.timetable_change,
            TimelineReference::OrderCreated => self.order_created,
        }
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
