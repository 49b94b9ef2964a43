use crate::item::OrderItem;
use crate::registry::PhaseTemplateDefinition;
use crate::types::BucketGranularity;
use chrono::{DateTime, Datelike, Duration, Utc};

// ---------------------------------------------------------------------------
// Bucket keys
// ---------------------------------------------------------------------------

/// Deduplication key for grouping items into one shared task. Pure function
/// of the definition's bucket granularity, the target date and the item.
pub fn bucket_key(
    definition: &PhaseTemplateDefinition,
    target: DateTime<Utc>,
    item: &OrderItem,
) -> String {
    bucket_key_for(definition.window.bucket, target, item)
}

pub fn bucket_key_for(
    bucket: BucketGranularity,
    target: DateTime<Utc>,
    item: &OrderItem,
) -> String {
    match bucket {
        BucketGranularity::Year => item
            .timetable_year
            .clone()
            .unwrap_or_else(|| target.format("%Y").to_string()),
        BucketGranularity::Week => start_of_iso_week(target).format("%Y-%m-%d").to_string(),
        BucketGranularity::Hour => target.format("%Y-%m-%dT%H:00").to_string(),
        BucketGranularity::Day => target.format("%Y-%m-%d").to_string(),
    }
}

/// The Monday-aligned start of `target`'s ISO week, at midnight.
fn start_of_iso_week(target: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = target.weekday().num_days_from_monday() as i64;
    let monday = target - Duration::days(days_from_monday);
    monday
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
