use crate::condition::{AutomationCondition, SetMatch};
use crate::registry::PhaseTemplateDefinition;
use crate::template::{BusinessTemplate, DueRule, TemplateStep};
use crate::types::{BucketGranularity, TimelineReference, WindowUnit};
use crate::window::PhaseWindow;

// ---------------------------------------------------------------------------
// Built-in phase ids
// ---------------------------------------------------------------------------

pub const CAPACITY_PLANNING: &str = "capacity_planning";
pub const ANNUAL_REQUEST: &str = "annual_request";
pub const SHORT_TERM: &str = "short_term";
pub const AD_HOC: &str = "ad_hoc";

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

/// The immutable built-in scheduling phases, ordered by planning horizon.
pub fn builtin_definitions() -> Vec<PhaseTemplateDefinition> {
    vec![
        PhaseTemplateDefinition {
            id: CAPACITY_PLANNING.to_string(),
            label: "Capacity planning".to_string(),
            summary: "Long-range capacity model alignment ahead of the timetable change"
                .to_string(),
            timeline_reference: TimelineReference::TimetableChange,
            // Long-range planning stays a manual decision.
            auto_create: false,
            window: PhaseWindow::new(
                WindowUnit::Weeks,
                -78,
                -52,
                BucketGranularity::Year,
                "X-18 to X-12 months",
            ),
            template_id: "tpl-capacity-model".to_string(),
            source_phase: None,
            conditions: Vec::new(),
        },
        PhaseTemplateDefinition {
            id: ANNUAL_REQUEST.to_string(),
            label: "Annual request".to_string(),
            summary: "Path request for the annual timetable".to_string(),
            timeline_reference: TimelineReference::TimetableChange,
            auto_create: true,
            window: PhaseWindow::new(
                WindowUnit::Weeks,
                -52,
                -36,
                BucketGranularity::Year,
                "annual request window",
            ),
            template_id: "tpl-annual-request".to_string(),
            source_phase: Some(CAPACITY_PLANNING.to_string()),
            conditions: vec![AutomationCondition::ItemTag {
                mode: SetMatch::Excludes,
                value: "framework-agreement".to_string(),
            }],
        },
        PhaseTemplateDefinition {
            id: SHORT_TERM.to_string(),
            label: "Short-term".to_string(),
            summary: "Rolling planning inside the running timetable year".to_string(),
            timeline_reference: TimelineReference::ServiceStart,
            auto_create: true,
            window: PhaseWindow::new(
                WindowUnit::Days,
                -30,
                -7,
                BucketGranularity::Day,
                "30 to 7 days before first run",
            ),
            template_id: "tpl-short-term-check".to_string(),
            source_phase: Some(ANNUAL_REQUEST.to_string()),
            conditions: Vec::new(),
        },
        PhaseTemplateDefinition {
            id: AD_HOC.to_string(),
            label: "Ad-hoc".to_string(),
            summary: "Requests close to departure".to_string(),
            timeline_reference: TimelineReference::ServiceStart,
            auto_create: true,
            window: PhaseWindow::new(
                WindowUnit::Hours,
                -48,
                0,
                BucketGranularity::Hour,
                "last 48 hours",
            ),
            template_id: "tpl-ad-hoc-review".to_string(),
            source_phase: Some(SHORT_TERM.to_string()),
            conditions: Vec::new(),
        },
    ]
}

/// Templates referenced by the built-in definitions.
pub fn builtin_templates() -> Vec<BusinessTemplate> {
    vec![
        {
            let mut t = BusinessTemplate::new(
                "tpl-capacity-model",
                "Align capacity model",
                "Review the requested volumes against the published capacity model \
                 and flag conflicts to the infrastructure manager.",
                "capacity",
                "capacity-team",
                DueRule::target_plus(-30, "a month before the window closes"),
            );
            t.default_lead_time_days = 60;
            t.steps = vec![
                TemplateStep::new("Pull the published capacity model"),
                TemplateStep::new("Compare against ordered volumes"),
                TemplateStep::new("Escalate conflicts"),
            ];
            t
        },
        {
            let mut t = BusinessTemplate::new(
                "tpl-annual-request",
                "File annual path request",
                "Collect the order line items for the coming timetable year and file \
                 the path request batch.",
                "planning",
                "timetable-office",
                DueRule::target_plus(30, "one month after the reference date"),
            );
            t.default_lead_time_days = 30;
            t.instructions = Some(
                "Batch all items of one timetable year into a single request.".to_string(),
            );
            t
        },
        {
            let mut t = BusinessTemplate::new(
                "tpl-short-term-check",
                "Run short-term feasibility check",
                "Check the item against the current timetable and confirm the slot \
                 is still available.",
                "planning",
                "dispatch",
                DueRule::target_plus(-7, "a week before first run"),
            );
            t.default_lead_time_days = 7;
            t
        },
        {
            let mut t = BusinessTemplate::new(
                "tpl-ad-hoc-review",
                "Review ad-hoc request",
                "Confirm rolling stock and crew for the ad-hoc slot.",
                "dispatch",
                "dispatch",
                DueRule::creation_plus(1, "next day"),
            );
            t.default_lead_time_days = 1;
            t
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
