//! Due-time admission and formatting.
//!
//! # Responsibility
//! - Turn user-supplied due input into UTC epoch milliseconds.
//! - Render epoch milliseconds for notification bodies and listings.
//!
//! # Invariants
//! - Malformed input is rejected here; the reminder evaluator never sees it.
//! - Parsed results are never negative.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MS_PER_MINUTE: i64 = 60_000;

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?$").expect("valid relative due regex")
});
static EPOCH_MS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,15}$").expect("valid epoch regex"));

/// Rejection reasons for due-time input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueParseError {
    Empty,
    Malformed(String),
    OutOfRange(String),
}

impl Display for DueParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "due time must not be empty"),
            Self::Malformed(value) => write!(
                f,
                "unrecognized due time `{value}`; expected RFC 3339, epoch ms, or +1d2h30m"
            ),
            Self::OutOfRange(value) => write!(f, "due time `{value}` is out of range"),
        }
    }
}

impl Error for DueParseError {}

/// Parses due input relative to `now_ms`.
///
/// Accepts RFC 3339 (`2026-10-16T14:30:00+02:00`), raw epoch milliseconds,
/// and relative offsets such as `+90m`, `+2h`, `+1d`, `+1h30m`.
///
/// # Errors
/// - `Empty` for blank input.
/// - `Malformed` when no accepted form matches.
/// - `OutOfRange` when the result would be negative or overflow.
pub fn parse_due_at(input: &str, now_ms: i64) -> Result<i64, DueParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DueParseError::Empty);
    }

    if let Some(caps) = RELATIVE_RE.captures(trimmed) {
        let unit = |index: usize, minutes: i64| -> Result<i64, DueParseError> {
            match caps.get(index) {
                Some(m) => m
                    .as_str()
                    .parse::<i64>()
                    .ok()
                    .and_then(|value| value.checked_mul(minutes))
                    .ok_or_else(|| DueParseError::OutOfRange(trimmed.to_string())),
                None => Ok(0),
            }
        };
        if caps.get(1).is_none() && caps.get(2).is_none() && caps.get(3).is_none() {
            return Err(DueParseError::Malformed(trimmed.to_string()));
        }
        let (days, hours, minutes) = (unit(1, 24 * 60)?, unit(2, 60)?, unit(3, 1)?);
        return days
            .checked_add(hours)
            .and_then(|value| value.checked_add(minutes))
            .and_then(|total| total.checked_mul(MS_PER_MINUTE))
            .and_then(|offset| now_ms.checked_add(offset))
            .filter(|value| *value >= 0)
            .ok_or_else(|| DueParseError::OutOfRange(trimmed.to_string()));
    }

    if EPOCH_MS_RE.is_match(trimmed) {
        return trimmed
            .parse::<i64>()
            .map_err(|_| DueParseError::OutOfRange(trimmed.to_string()));
    }

    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map_err(|_| DueParseError::Malformed(trimmed.to_string()))?;
    let millis = parsed.timestamp_millis();
    if millis < 0 {
        return Err(DueParseError::OutOfRange(trimmed.to_string()));
    }
    Ok(millis)
}

/// Formats epoch milliseconds as an RFC 3339 UTC string (minute precision
/// is not enforced; seconds are kept).
pub fn format_due_at(due_at: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(due_at) {
        Some(value) => value.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => format!("{due_at}ms"),
    }
}

/// Current wall-clock time in UTC epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{format_due_at, parse_due_at, DueParseError};

    const NOW: i64 = 1_760_000_000_000;

    #[test]
    fn parses_relative_offsets() {
        assert_eq!(parse_due_at("+90m", NOW), Ok(NOW + 90 * 60_000));
        assert_eq!(parse_due_at("+2h", NOW), Ok(NOW + 120 * 60_000));
        assert_eq!(parse_due_at("+1d1h30m", NOW), Ok(NOW + (1440 + 90) * 60_000));
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let utc = parse_due_at("2026-10-16T12:00:00Z", NOW).unwrap();
        let offset = parse_due_at("2026-10-16T14:00:00+02:00", NOW).unwrap();
        assert_eq!(utc, offset);
        assert_eq!(format_due_at(utc), "2026-10-16T12:00:00Z");
    }

    #[test]
    fn parses_epoch_millis() {
        assert_eq!(parse_due_at(" 1700000000000 ", NOW), Ok(1_700_000_000_000));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_due_at("   ", NOW), Err(DueParseError::Empty));
        assert!(matches!(
            parse_due_at("tomorrow-ish", NOW),
            Err(DueParseError::Malformed(_))
        ));
        assert!(matches!(parse_due_at("+", NOW), Err(DueParseError::Malformed(_))));
        assert!(matches!(
            parse_due_at("2026-13-40T99:00:00Z", NOW),
            Err(DueParseError::Malformed(_))
        ));
    }
}
