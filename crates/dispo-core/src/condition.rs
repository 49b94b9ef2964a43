use crate::item::OrderItem;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Match modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMatch {
    Includes,
    Excludes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equality {
    Equals,
    NotEquals,
}

// ---------------------------------------------------------------------------
// AutomationCondition
// ---------------------------------------------------------------------------

/// One predicate gating phase automation. Each field variant carries only
/// the operators valid for it, so an unknown field/operator pairing cannot
/// be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum AutomationCondition {
    /// Item tag set membership, case-insensitive.
    ItemTag { mode: SetMatch, value: String },
    /// Exact match on the item kind.
    ItemKind { mode: Equality, value: String },
    /// Exact match on the scheduling phase being entered.
    SchedulingPhase { mode: Equality, value: String },
    /// Exact match on the item's timetable-side phase attribute; items
    /// without one compare as the empty string.
    TimetablePhase { mode: Equality, value: String },
}

impl AutomationCondition {
    fn holds(&self, item: &OrderItem, phase: &str) -> bool {
        match self {
            AutomationCondition::ItemTag { mode, value } => {
                let present = item.has_tag(value);
                match mode {
                    SetMatch::Includes => present,
                    SetMatch::Excludes => !present,
                }
            }
            AutomationCondition::ItemKind { mode, value } => {
                equality_holds(*mode, &item.kind, value)
            }
            AutomationCondition::SchedulingPhase { mode, value } => {
                equality_holds(*mode, phase, value)
            }
            AutomationCondition::TimetablePhase { mode, value } => {
                equality_holds(*mode, item.timetable_phase.as_deref().unwrap_or(""), value)
            }
        }
    }
}

fn equality_holds(mode: Equality, actual: &str, expected: &str) -> bool {
    match mode {
        Equality::Equals => actual == expected,
        Equality::NotEquals => actual != expected,
    }
}

/// Evaluate a conjunction of conditions. An empty list always passes.
pub fn passes(conditions: &[AutomationCondition], item: &OrderItem, phase: &str) -> bool {
    conditions.iter().all(|c| c.holds(item, phase))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
