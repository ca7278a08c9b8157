//! Countdown projection for listings.
//!
//! Display only: refreshed on whatever cadence the caller likes and never
//! consulted by the reminder engine.

use std::fmt::{Display, Formatter};

const MS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining { days: i64, hours: i64, minutes: i64 },
    DueNow,
    Overdue { minutes: i64 },
}

impl Countdown {
    pub fn between(now_ms: i64, due_at: i64) -> Self {
        let delta = due_at.saturating_sub(now_ms);
        if delta < 0 {
            // Round up so one second late reads as one minute overdue.
            let late = delta.saturating_neg().saturating_add(MS_PER_MINUTE - 1) / MS_PER_MINUTE;
            return Self::Overdue { minutes: late };
        }
        let total_minutes = delta / MS_PER_MINUTE;
        if total_minutes == 0 {
            return Self::DueNow;
        }
        Self::Remaining {
            days: total_minutes / (24 * 60),
            hours: (total_minutes / 60) % 24,
            minutes: total_minutes % 60,
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Self::Overdue { .. })
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remaining {
                days,
                hours,
                minutes,
            } => {
                if *days > 0 {
                    write!(f, "{days}d {hours}h {minutes}m")
                } else if *hours > 0 {
                    write!(f, "{hours}h {minutes}m")
                } else {
                    write!(f, "{minutes}m")
                }
            }
            Self::DueNow => write!(f, "due now"),
            Self::Overdue { minutes } => write!(f, "overdue by {minutes}m"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Countdown;

    const NOW: i64 = 1_760_000_000_000;
    const MINUTE: i64 = 60_000;

    #[test]
    fn splits_remaining_time() {
        let countdown = Countdown::between(NOW, NOW + (26 * 60 + 5) * MINUTE);
        assert_eq!(
            countdown,
            Countdown::Remaining {
                days: 1,
                hours: 2,
                minutes: 5
            }
        );
        assert_eq!(countdown.to_string(), "1d 2h 5m");
    }

    #[test]
    fn sub_minute_is_due_now_and_past_is_overdue() {
        assert_eq!(Countdown::between(NOW, NOW + 30_000), Countdown::DueNow);
        let overdue = Countdown::between(NOW, NOW - 1_000);
        assert!(overdue.is_overdue());
        assert_eq!(overdue.to_string(), "overdue by 1m");
    }
}
