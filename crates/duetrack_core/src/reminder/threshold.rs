//! Threshold evaluation.
//!
//! A threshold of `W` minutes is in window while the floored minutes
//! remaining until due satisfy `W - 1 < remaining <= W`. With integer
//! minutes that is a one-minute band, sized to the polling interval.

use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: i64 = 60_000;

/// A reminder point: fire `window_minutes` before the due time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub window_minutes: u32,
    pub label: String,
}

impl Threshold {
    pub fn new(window_minutes: u32, label: impl Into<String>) -> Self {
        Self {
            window_minutes,
            label: label.into(),
        }
    }

    /// Whether `minutes_remaining` falls in this threshold's firing band.
    ///
    /// Never true once the task is due or overdue.
    pub fn is_in_window(&self, minutes_remaining: i64) -> bool {
        if minutes_remaining <= 0 {
            return false;
        }
        let window = i64::from(self.window_minutes);
        window - 1 < minutes_remaining && minutes_remaining <= window
    }
}

/// Default reminder points: 5h, 2h, 1h, 30m, 10m.
pub fn default_thresholds() -> Vec<Threshold> {
    vec![
        Threshold::new(300, "5 hours"),
        Threshold::new(120, "2 hours"),
        Threshold::new(60, "1 hour"),
        Threshold::new(30, "30 minutes"),
        Threshold::new(10, "10 minutes"),
    ]
}

/// Whole minutes until `due_at`, floored (negative when overdue).
pub fn minutes_remaining(now_ms: i64, due_at: i64) -> i64 {
    due_at.saturating_sub(now_ms).div_euclid(MS_PER_MINUTE)
}

/// Thresholds currently in window for a task, in the order given.
///
/// `thresholds` is expected in descending window order; the result keeps it.
pub fn thresholds_in_window<'a>(
    thresholds: &'a [Threshold],
    now_ms: i64,
    due_at: Option<i64>,
) -> Vec<&'a Threshold> {
    let Some(due_at) = due_at else {
        return Vec::new();
    };
    let remaining = minutes_remaining(now_ms, due_at);
    thresholds
        .iter()
        .filter(|threshold| threshold.is_in_window(remaining))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{default_thresholds, minutes_remaining, thresholds_in_window, Threshold};

    const NOW: i64 = 1_760_000_000_000;
    const MINUTE: i64 = 60_000;

    #[test]
    fn minutes_remaining_floors_towards_negative_infinity() {
        assert_eq!(minutes_remaining(NOW, NOW + 90 * 1000), 1);
        assert_eq!(minutes_remaining(NOW, NOW + 59_999), 0);
        assert_eq!(minutes_remaining(NOW, NOW - 1), -1);
    }

    #[test]
    fn band_includes_exact_window_and_excludes_neighbours() {
        let threshold = Threshold::new(30, "30 minutes");
        assert!(threshold.is_in_window(30));
        assert!(!threshold.is_in_window(31));
        assert!(!threshold.is_in_window(29));
    }

    #[test]
    fn seconds_inside_the_minute_stay_in_window() {
        let thresholds = default_thresholds();
        let due = NOW + 60 * MINUTE + 59_000;
        let hits = thresholds_in_window(&thresholds, NOW, Some(due));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].window_minutes, 60);
    }

    #[test]
    fn no_due_date_yields_nothing() {
        assert!(thresholds_in_window(&default_thresholds(), NOW, None).is_empty());
    }

    #[test]
    fn overdue_or_due_now_yields_nothing() {
        let thresholds = vec![Threshold::new(1, "1 minute"), Threshold::new(0, "now")];
        assert!(thresholds_in_window(&thresholds, NOW, Some(NOW)).is_empty());
        assert!(thresholds_in_window(&thresholds, NOW, Some(NOW - 5 * MINUTE)).is_empty());
    }
}
