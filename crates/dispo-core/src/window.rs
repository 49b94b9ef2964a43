use crate::error::{DispoError, Result};
use crate::types::{BucketGranularity, WindowUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offsets beyond ten years are treated as authoring mistakes.
const MAX_OFFSET_MINUTES: i64 = 10 * 366 * 1_440;

// ---------------------------------------------------------------------------
// PhaseWindow
// ---------------------------------------------------------------------------

/// Relative time range around an anchor date during which automation may
/// fire. `start` and `end` are offsets in `unit` steps; negative offsets lie
/// before the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWindow {
    pub unit: WindowUnit,
    pub start: i64,
    pub end: i64,
    pub bucket: BucketGranularity,
    pub label: String,
}

impl PhaseWindow {
    pub fn new(
        unit: WindowUnit,
        start: i64,
        end: i64,
        bucket: BucketGranularity,
        label: impl Into<String>,
    ) -> Self {
        Self {
            unit,
            start,
            end,
            bucket,
            label: label.into(),
        }
    }

    /// Reject malformed windows before they reach the registry.
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(DispoError::InvalidWindow(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        let (start_min, end_min) = self.bounds_minutes();
        if start_min.abs() > MAX_OFFSET_MINUTES || end_min.abs() > MAX_OFFSET_MINUTES {
            return Err(DispoError::InvalidWindow(format!(
                "offsets exceed ten years: {}..{} {}",
                self.start, self.end, self.unit
            )));
        }
        Ok(())
    }

    fn bounds_minutes(&self) -> (i64, i64) {
        let per = self.unit.minutes_per();
        (self.start.saturating_mul(per), self.end.saturating_mul(per))
    }
}

// ---------------------------------------------------------------------------
// Window matching
// ---------------------------------------------------------------------------

/// Whether `target` falls inside `window` as of `now`.
///
/// The signed difference `target - now` in minutes is compared against the
/// window bounds converted to minutes. Bounds are normalized with min/max so
/// windows authored with `start > end` (pre-validation user input) still
/// match sensibly. Both bounds are inclusive.
pub fn is_within_window(window: &PhaseWindow, target: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let diff_minutes = (target - now).num_minutes();
    let (start_min, end_min) = window.bounds_minutes();
    let lo = start_min.min(end_min);
    let hi = start_min.max(end_min);
    lo <= diff_minutes && diff_minutes <= hi
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn days_window(start: i64, end: i64) -> PhaseWindow {
        PhaseWindow::new(
            WindowUnit::Days,
            start,
            end,
            BucketGranularity::Day,
            "test",
        )
    }

    #[test]
    fn past_window_matches_past_target() {
        // -30..-7 days: the target must lie 7 to 30 days BEFORE now.
        let w = days_window(-30, -7);
        let now = at(2025, 1, 1, 0);

        assert!(is_within_window(&w, now - chrono::Duration::days(7), now));
        assert!(is_within_window(&w, now - chrono::Duration::days(30), now));
        assert!(is_within_window(&w, now - chrono::Duration::days(15), now));
        assert!(!is_within_window(&w, now - chrono::Duration::days(31), now));
        assert!(!is_within_window(&w, now - chrono::Duration::days(6), now));
    }

    #[test]
    fn future_target_not_in_negative_window() {
        // diff is signed: a target 7 days AHEAD gives +10080 minutes, which
        // is outside [-43200, -10080] even though |diff| equals the boundary.
        let w = days_window(-30, -7);
        let now = at(2025, 1, 1, 0);
        let target = at(2025, 1, 8, 0);

        assert!(!is_within_window(&w, target, now));
        assert!(!is_within_window(&w, now + chrono::Duration::days(10), now));
    }

    #[test]
    fn reversed_bounds_are_normalized() {
        let w = days_window(-7, -7);
        let reversed = PhaseWindow::new(
            WindowUnit::Days,
            -7,
            -30,
            BucketGranularity::Day,
            "reversed",
        );
        let now = at(2025, 1, 1, 0);
        let target = now - chrono::Duration::days(10);

        assert!(!is_within_window(&w, target, now));
        assert!(is_within_window(&reversed, target, now));
    }

    #[test]
    fn hour_and_week_units() {
        let hours = PhaseWindow::new(WindowUnit::Hours, -2, 2, BucketGranularity::Hour, "h");
        let now = at(2025, 6, 1, 12);
        assert!(is_within_window(&hours, at(2025, 6, 1, 10), now));
        assert!(is_within_window(&hours, at(2025, 6, 1, 14), now));
        assert!(!is_within_window(&hours, at(2025, 6, 1, 15), now));

        let weeks = PhaseWindow::new(WindowUnit::Weeks, -4, -1, BucketGranularity::Week, "w");
        assert!(is_within_window(&weeks, now - chrono::Duration::weeks(2), now));
        assert!(!is_within_window(&weeks, now - chrono::Duration::weeks(5), now));
    }

    #[test]
    fn validate_rejects_inverted_and_oversized() {
        assert!(days_window(-30, -7).validate().is_ok());
        assert!(days_window(-7, -30).validate().is_err());
        assert!(days_window(-30, 4_000_000).validate().is_err());
    }
}
