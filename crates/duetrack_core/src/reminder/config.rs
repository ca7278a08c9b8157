//! Reminder configuration.
//!
//! # Responsibility
//! - Hold the polling interval, threshold list and far cutoff.
//! - Validate and normalize user-provided configuration.
//!
//! # Invariants
//! - A validated config has thresholds sorted by descending window, with
//!   unique non-zero windows and non-blank labels.
//! - The effective far cutoff is never below the largest window.

use super::threshold::{default_thresholds, Threshold};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;

/// How the far cutoff is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "minutes")]
pub enum FarCutoff {
    /// Follows the largest configured window.
    #[default]
    LargestWindow,
    /// Pinned value in minutes; must be >= the largest window.
    Fixed(u32),
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    NoThresholds,
    ZeroWindow,
    DuplicateWindow(u32),
    BlankLabel(u32),
    ZeroPollInterval,
    CutoffBelowLargestWindow { cutoff: u32, largest: u32 },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoThresholds => write!(f, "at least one reminder threshold is required"),
            Self::ZeroWindow => write!(f, "threshold window must be at least one minute"),
            Self::DuplicateWindow(window) => write!(f, "duplicate threshold window {window}"),
            Self::BlankLabel(window) => write!(f, "threshold {window} has a blank label"),
            Self::ZeroPollInterval => write!(f, "poll_interval_ms must be > 0"),
            Self::CutoffBelowLargestWindow { cutoff, largest } => write!(
                f,
                "far cutoff {cutoff} is below the largest threshold window {largest}"
            ),
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Externally configurable reminder parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub poll_interval_ms: u64,
    pub thresholds: Vec<Threshold>,
    pub far_cutoff: FarCutoff,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            thresholds: default_thresholds(),
            far_cutoff: FarCutoff::LargestWindow,
        }
    }
}

impl ReminderConfig {
    /// Loads a JSON config file and validates it. Missing fields take
    /// their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()
    }

    /// Sorts thresholds descending and checks all invariants.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.thresholds.is_empty() {
            return Err(ConfigError::NoThresholds);
        }

        let mut seen = HashSet::new();
        for threshold in &self.thresholds {
            if threshold.window_minutes == 0 {
                return Err(ConfigError::ZeroWindow);
            }
            if threshold.label.trim().is_empty() {
                return Err(ConfigError::BlankLabel(threshold.window_minutes));
            }
            if !seen.insert(threshold.window_minutes) {
                return Err(ConfigError::DuplicateWindow(threshold.window_minutes));
            }
        }

        self.sort_thresholds();

        if let FarCutoff::Fixed(cutoff) = self.far_cutoff {
            let largest = self.largest_window();
            if cutoff < largest {
                return Err(ConfigError::CutoffBelowLargestWindow { cutoff, largest });
            }
        }

        Ok(self)
    }

    /// Puts thresholds in descending window order without rejecting
    /// anything. Used for configs that skipped `validate`.
    pub fn normalized(mut self) -> Self {
        self.sort_thresholds();
        self
    }

    fn sort_thresholds(&mut self) {
        self.thresholds.sort_by(|a, b| b.window_minutes.cmp(&a.window_minutes));
    }

    pub fn largest_window(&self) -> u32 {
        self.thresholds
            .iter()
            .map(|threshold| threshold.window_minutes)
            .max()
            .unwrap_or(0)
    }

    /// Minutes-remaining value beyond which a task's ledger state is stale.
    ///
    /// A fixed cutoff below the largest window is raised to it, so no
    /// threshold can sit beyond the cutoff.
    pub fn far_cutoff_minutes(&self) -> u32 {
        let largest = self.largest_window();
        match self.far_cutoff {
            FarCutoff::LargestWindow => largest,
            FarCutoff::Fixed(minutes) => minutes.max(largest),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FarCutoff, ReminderConfig};
    use crate::reminder::threshold::Threshold;

    #[test]
    fn default_config_is_valid_and_cutoff_tracks_largest_window() {
        let config = ReminderConfig::default().validate().unwrap();
        assert_eq!(config.poll_interval_ms, 60_000);
        assert_eq!(config.far_cutoff_minutes(), 300);
        let windows: Vec<u32> = config.thresholds.iter().map(|t| t.window_minutes).collect();
        assert_eq!(windows, vec![300, 120, 60, 30, 10]);
    }

    #[test]
    fn validate_sorts_thresholds_descending() {
        let config = ReminderConfig {
            thresholds: vec![
                Threshold::new(15, "15 minutes"),
                Threshold::new(1440, "1 day"),
            ],
            ..ReminderConfig::default()
        }
        .validate()
        .unwrap();

        assert_eq!(config.thresholds[0].window_minutes, 1440);
        assert_eq!(config.far_cutoff_minutes(), 1440);
    }

    #[test]
    fn validate_rejects_duplicates_and_low_fixed_cutoff() {
        let duplicate = ReminderConfig {
            thresholds: vec![Threshold::new(10, "a"), Threshold::new(10, "b")],
            ..ReminderConfig::default()
        };
        assert!(matches!(
            duplicate.validate(),
            Err(ConfigError::DuplicateWindow(10))
        ));

        let low_cutoff = ReminderConfig {
            far_cutoff: FarCutoff::Fixed(200),
            ..ReminderConfig::default()
        };
        assert!(matches!(
            low_cutoff.validate(),
            Err(ConfigError::CutoffBelowLargestWindow {
                cutoff: 200,
                largest: 300
            })
        ));
    }

    #[test]
    fn normalized_sorts_and_low_fixed_cutoff_is_raised() {
        let config = ReminderConfig {
            thresholds: vec![
                Threshold::new(10, "10 minutes"),
                Threshold::new(90, "90 minutes"),
            ],
            far_cutoff: FarCutoff::Fixed(30),
            ..ReminderConfig::default()
        }
        .normalized();

        assert_eq!(config.thresholds[0].window_minutes, 90);
        assert_eq!(config.far_cutoff_minutes(), 90);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config: ReminderConfig =
            serde_json::from_str(r#"{"far_cutoff":{"mode":"fixed","minutes":600}}"#).unwrap();
        let config = config.validate().unwrap();
        assert_eq!(config.poll_interval_ms, 60_000);
        assert_eq!(config.thresholds.len(), 5);
        assert_eq!(config.far_cutoff_minutes(), 600);
    }
}
