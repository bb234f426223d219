//! Read-only configuration passed into every entry point.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Legal limits checked by the infraction engine.
///
/// Durations are stored in minutes so configuration files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Shortest acceptable meal break. Default: 60.
    pub meal_min_minutes: i64,

    /// Longest acceptable shift span. Default: 780 (13 hours).
    pub daily_span_max_minutes: i64,

    /// Shortest acceptable rest between shifts. Default: 480 (8 hours).
    pub interstice_min_minutes: i64,

    /// Driving allowed before a rest block is due. Default: 330 (5h30).
    pub continuous_driving_max_minutes: i64,

    /// Rest required within each driving block, possibly fragmented. Default: 30.
    pub driving_rest_min_minutes: i64,

    /// Consecutive working days allowed. Default: 6.
    pub consecutive_days_max: u32,

    /// Weekly worked time allowed. Default: 4320 (72 hours).
    pub weekly_work_max_minutes: i64,

    /// Shortest acceptable weekly rest. Default: 2100 (35 hours).
    pub weekly_rest_min_minutes: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            meal_min_minutes: 60,
            daily_span_max_minutes: 13 * 60,
            interstice_min_minutes: 8 * 60,
            continuous_driving_max_minutes: 5 * 60 + 30,
            driving_rest_min_minutes: 30,
            consecutive_days_max: 6,
            weekly_work_max_minutes: 72 * 60,
            weekly_rest_min_minutes: 35 * 60,
        }
    }
}

impl Thresholds {
    pub fn meal_min(&self) -> Duration {
        Duration::minutes(self.meal_min_minutes)
    }

    pub fn daily_span_max(&self) -> Duration {
        Duration::minutes(self.daily_span_max_minutes)
    }

    pub fn interstice_min(&self) -> Duration {
        Duration::minutes(self.interstice_min_minutes)
    }

    pub fn continuous_driving_max(&self) -> Duration {
        Duration::minutes(self.continuous_driving_max_minutes)
    }

    pub fn driving_rest_min(&self) -> Duration {
        Duration::minutes(self.driving_rest_min_minutes)
    }

    pub fn weekly_work_max(&self) -> Duration {
        Duration::minutes(self.weekly_work_max_minutes)
    }

    pub fn weekly_rest_min(&self) -> Duration {
        Duration::minutes(self.weekly_rest_min_minutes)
    }

    /// Rejects limits that would make a rule meaningless.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let minutes = [
            ("meal_min_minutes", self.meal_min_minutes),
            ("daily_span_max_minutes", self.daily_span_max_minutes),
            ("interstice_min_minutes", self.interstice_min_minutes),
            (
                "continuous_driving_max_minutes",
                self.continuous_driving_max_minutes,
            ),
            ("driving_rest_min_minutes", self.driving_rest_min_minutes),
            ("weekly_work_max_minutes", self.weekly_work_max_minutes),
            ("weekly_rest_min_minutes", self.weekly_rest_min_minutes),
            (
                "consecutive_days_max",
                i64::from(self.consecutive_days_max),
            ),
        ];
        match minutes.into_iter().find(|(_, value)| *value <= 0) {
            Some((field, value)) => Err(ValidationError::NonPositiveThreshold { field, value }),
            None => Ok(()),
        }
    }
}

/// Inputs to the workload resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Enables per-criterion overrides. When off the legacy rules apply.
    pub special_workload_enabled: bool,

    /// Ceiling for configured overrides, in hours. Default: 12.
    pub max_override_hours: u32,

    /// Criterion name to `DEFAULT` or `HH:00`.
    pub overrides: BTreeMap<String, String>,

    /// Dates with no expected workload.
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            special_workload_enabled: false,
            max_override_hours: 12,
            overrides: BTreeMap::new(),
            holidays: BTreeSet::new(),
        }
    }
}

impl WorkloadConfig {
    /// Configured override for a criterion, matched case-insensitively.
    pub fn override_for(&self, criterion: &str) -> Option<&str> {
        let wanted = criterion.trim().to_uppercase();
        if wanted.is_empty() {
            return None;
        }
        self.overrides
            .iter()
            .find(|(name, _)| name.trim().to_uppercase() == wanted)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_the_legal_limits() {
        let t = Thresholds::default();
        assert_eq!(t.meal_min(), Duration::hours(1));
        assert_eq!(t.daily_span_max(), Duration::hours(13));
        assert_eq!(t.interstice_min(), Duration::hours(8));
        assert_eq!(t.continuous_driving_max(), Duration::minutes(330));
        assert_eq!(t.driving_rest_min(), Duration::minutes(30));
        assert_eq!(t.consecutive_days_max, 6);
        assert_eq!(t.weekly_work_max(), Duration::hours(72));
        assert_eq!(t.weekly_rest_min(), Duration::hours(35));
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn test_zero_driving_limit_is_rejected() {
        let t = Thresholds {
            continuous_driving_max_minutes: 0,
            ..Thresholds::default()
        };
        assert_eq!(
            t.validate(),
            Err(ValidationError::NonPositiveThreshold {
                field: "continuous_driving_max_minutes",
                value: 0
            })
        );
    }

    #[test]
    fn test_partial_thresholds_fill_in_defaults() {
        let t: Thresholds = serde_json::from_str(r#"{"meal_min_minutes": 45}"#).unwrap();
        assert_eq!(t.meal_min_minutes, 45);
        assert_eq!(t.weekly_rest_min_minutes, 35 * 60);
    }

    #[test]
    fn test_override_lookup_ignores_case() {
        let config = WorkloadConfig {
            overrides: BTreeMap::from([("Garagem".to_string(), "06:00".to_string())]),
            ..WorkloadConfig::default()
        };
        assert_eq!(config.override_for("GARAGEM"), Some("06:00"));
        assert_eq!(config.override_for("FÉRIAS"), None);
        assert_eq!(config.override_for(""), None);
    }
}
