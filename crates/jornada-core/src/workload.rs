//! Expected workload and 50% overtime resolution.
//!
//! Two policies exist. The special policy honours per-criterion overrides
//! written as `HH:00`; the legacy policy ignores overrides and instead zeroes
//! the workload for a fixed list of leave criteria. The policy is chosen once
//! per call from [`WorkloadConfig::special_workload_enabled`].

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;

use crate::config::WorkloadConfig;
use crate::error::ValidationError;

/// Lower bound for negative overtime, one full day.
pub const OVERTIME_FLOOR_MINUTES: i64 = 24 * 60;

/// Expected workload on a regular weekday.
pub const WEEKDAY_WORKLOAD_MINUTES: i64 = 8 * 60;

/// Expected workload on a Saturday.
pub const SATURDAY_WORKLOAD_MINUTES: i64 = 4 * 60;

/// Criteria that carry an actual journey (depot days, loading/unloading).
const JOURNEY_CRITERIA: &[&str] = &["GARAGEM", "CARGA/DESCARGA"];

/// Leave criteria with no expected workload under the legacy policy.
const ZERO_WORKLOAD_CRITERIA: &[&str] = &[
    "FÉRIAS",
    "ATESTADO",
    "AFASTAMENTO",
    "LIC. ÓBITO",
    "LIC. PATERNIDADE",
    "LIC. MATERNIDADE",
];

static OVERRIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[0-9]|1[0-2]):00$").expect("valid regex"));

/// A workload override as entered for a criterion or a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadOverride {
    /// Fall through to the holiday and weekday rules.
    Default,
    /// A fixed number of whole hours.
    Hours(u32),
}

impl WorkloadOverride {
    /// Override value in minutes, `None` for [`WorkloadOverride::Default`].
    pub fn minutes(self) -> Option<i64> {
        match self {
            Self::Default => None,
            Self::Hours(hours) => Some(i64::from(hours) * 60),
        }
    }
}

impl FromStr for WorkloadOverride {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("DEFAULT") || text == "Padrão" {
            return Ok(Self::Default);
        }
        let caps = OVERRIDE_RE
            .captures(text)
            .ok_or_else(|| ValidationError::InvalidOverride {
                value: text.to_string(),
            })?;
        caps[1]
            .parse()
            .map(Self::Hours)
            .map_err(|_| ValidationError::InvalidOverride {
                value: text.to_string(),
            })
    }
}

/// Parses an override and checks it against the configured ceiling.
pub fn validate_override(text: &str, max_hours: u32) -> Result<WorkloadOverride, ValidationError> {
    let parsed: WorkloadOverride = text.parse()?;
    match parsed {
        WorkloadOverride::Hours(hours) if hours > max_hours => {
            Err(ValidationError::OverrideAboveLimit {
                value: text.trim().to_string(),
                max_hours,
            })
        }
        _ => Ok(parsed),
    }
}

/// Renders a workload as whole hours, `HH:00`. Leftover minutes are dropped.
pub fn format_workload(minutes: i64) -> String {
    format!("{:02}:00", minutes.max(0) / 60)
}

/// How workload and overtime are derived for a criterion.
trait WorkloadPolicy {
    /// Reads the override text, or ignores it when the policy has no overrides.
    fn parse_override(&self, text: Option<&str>) -> Result<WorkloadOverride, ValidationError>;

    fn workload(&self, criterion: &str, date: NaiveDate, override_: WorkloadOverride) -> i64;

    fn worked_minutes(&self, journey_minutes: i64, criterion: &str) -> i64;

    fn overtime_50(&self, worked_minutes: i64, override_: WorkloadOverride, criterion: &str)
    -> i64;
}

struct SpecialWorkload<'a> {
    config: &'a WorkloadConfig,
}

struct LegacyWorkload<'a> {
    config: &'a WorkloadConfig,
}

impl WorkloadPolicy for SpecialWorkload<'_> {
    fn parse_override(&self, text: Option<&str>) -> Result<WorkloadOverride, ValidationError> {
        text.map_or(Ok(WorkloadOverride::Default), |t| {
            validate_override(t, self.config.max_override_hours)
        })
    }

    fn workload(&self, _criterion: &str, date: NaiveDate, override_: WorkloadOverride) -> i64 {
        if let Some(minutes) = override_.minutes() {
            return minutes;
        }
        if self.config.is_holiday(date) {
            return 0;
        }
        weekday_workload(date.weekday())
    }

    fn worked_minutes(&self, journey_minutes: i64, criterion: &str) -> i64 {
        if has_journey(criterion) {
            journey_minutes
        } else {
            0
        }
    }

    fn overtime_50(
        &self,
        worked_minutes: i64,
        override_: WorkloadOverride,
        criterion: &str,
    ) -> i64 {
        match override_.minutes() {
            Some(expected) => (worked_minutes - expected).max(-OVERTIME_FLOOR_MINUTES),
            None => journey_overtime(worked_minutes, criterion),
        }
    }
}

impl WorkloadPolicy for LegacyWorkload<'_> {
    fn parse_override(&self, _text: Option<&str>) -> Result<WorkloadOverride, ValidationError> {
        Ok(WorkloadOverride::Default)
    }

    fn workload(&self, criterion: &str, date: NaiveDate, _override: WorkloadOverride) -> i64 {
        if self.config.is_holiday(date) || matches_any(criterion, ZERO_WORKLOAD_CRITERIA) {
            return 0;
        }
        weekday_workload(date.weekday())
    }

    fn worked_minutes(&self, _journey_minutes: i64, criterion: &str) -> i64 {
        if has_journey(criterion) {
            WEEKDAY_WORKLOAD_MINUTES
        } else {
            0
        }
    }

    fn overtime_50(
        &self,
        worked_minutes: i64,
        _override: WorkloadOverride,
        criterion: &str,
    ) -> i64 {
        journey_overtime(worked_minutes, criterion)
    }
}

fn select_policy(config: &WorkloadConfig) -> Box<dyn WorkloadPolicy + '_> {
    if config.special_workload_enabled {
        Box::new(SpecialWorkload { config })
    } else {
        Box::new(LegacyWorkload { config })
    }
}

/// Expected workload in minutes for a criterion on a date.
///
/// Priority, first match wins:
/// 1. A concrete override (special policy only) gives `hours * 60`
/// 2. A holiday gives 0
/// 3. A legacy leave criterion gives 0 (legacy policy only)
/// 4. Sunday gives 0, Saturday 240, any other day 480
///
/// Fails when the special policy is active and the override is malformed or
/// above [`WorkloadConfig::max_override_hours`].
pub fn resolve_workload(
    config: &WorkloadConfig,
    criterion: &str,
    date: NaiveDate,
    override_text: Option<&str>,
) -> Result<i64, ValidationError> {
    let policy = select_policy(config);
    let override_ = policy.parse_override(override_text)?;
    let minutes = policy.workload(criterion, date, override_);
    tracing::trace!(criterion, %date, minutes, "resolved workload");
    Ok(minutes)
}

/// Overtime at 50% for a criterion.
///
/// With an override the result is `worked - override`, floored at -1440.
/// Without one, criteria carrying a journey earn `worked - 480` clamped at
/// zero, and every other criterion earns nothing.
pub fn resolve_overtime_50(
    config: &WorkloadConfig,
    worked_minutes: i64,
    override_: WorkloadOverride,
    criterion: &str,
) -> i64 {
    select_policy(config).overtime_50(worked_minutes, override_, criterion)
}

/// Worked minutes credited to a criterion day.
pub fn resolve_worked_minutes(config: &WorkloadConfig, journey_minutes: i64, criterion: &str) -> i64 {
    select_policy(config).worked_minutes(journey_minutes, criterion)
}

/// Workload figures of one day, all in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWorkload {
    pub workload: i64,
    pub worked: i64,
    pub overtime: i64,
}

/// Resolves workload, worked time and overtime of a day under one policy.
///
/// A day without a criterion is credited its whole journey and its overtime
/// is `journey - workload`, floored at -1440. A criterion day follows the
/// same rules as [`resolve_worked_minutes`] and [`resolve_overtime_50`].
pub fn resolve_day_workload(
    config: &WorkloadConfig,
    criterion: &str,
    date: NaiveDate,
    override_text: Option<&str>,
    journey_minutes: i64,
) -> Result<DayWorkload, ValidationError> {
    let policy = select_policy(config);
    let override_ = policy.parse_override(override_text)?;
    let workload = policy.workload(criterion, date, override_);

    let (worked, overtime) = if criterion.trim().is_empty() {
        (
            journey_minutes,
            (journey_minutes - workload).max(-OVERTIME_FLOOR_MINUTES),
        )
    } else {
        (
            policy.worked_minutes(journey_minutes, criterion),
            policy.overtime_50(journey_minutes, override_, criterion),
        )
    };
    tracing::trace!(criterion, %date, workload, worked, overtime, "resolved day workload");

    Ok(DayWorkload {
        workload,
        worked,
        overtime,
    })
}

const fn weekday_workload(weekday: Weekday) -> i64 {
    match weekday {
        Weekday::Sun => 0,
        Weekday::Sat => SATURDAY_WORKLOAD_MINUTES,
        _ => WEEKDAY_WORKLOAD_MINUTES,
    }
}

fn journey_overtime(worked_minutes: i64, criterion: &str) -> i64 {
    if has_journey(criterion) {
        (worked_minutes - WEEKDAY_WORKLOAD_MINUTES).max(0)
    } else {
        0
    }
}

fn has_journey(criterion: &str) -> bool {
    matches_any(criterion, JOURNEY_CRITERIA)
}

fn matches_any(criterion: &str, list: &[&str]) -> bool {
    let wanted = criterion.trim().to_uppercase();
    list.iter().any(|c| *c == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    // 2025-03-09 is a Sunday.
    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn special() -> WorkloadConfig {
        WorkloadConfig {
            special_workload_enabled: true,
            ..WorkloadConfig::default()
        }
    }

    fn with_holiday(mut config: WorkloadConfig, day: u32) -> WorkloadConfig {
        config.holidays = BTreeSet::from([date(day)]);
        config
    }

    #[test]
    fn test_weekday_rule() {
        let config = special();
        assert_eq!(resolve_workload(&config, "", date(9), None), Ok(0));
        assert_eq!(resolve_workload(&config, "", date(8), None), Ok(240));
        assert_eq!(resolve_workload(&config, "", date(10), None), Ok(480));
    }

    #[test]
    fn test_override_beats_holiday_and_weekday() {
        let config = with_holiday(special(), 10);
        assert_eq!(
            resolve_workload(&config, "GARAGEM", date(10), Some("08:00")),
            Ok(480)
        );
        assert_eq!(
            resolve_workload(&config, "GARAGEM", date(9), Some("08:00")),
            Ok(480)
        );
    }

    #[test]
    fn test_holiday_without_override_is_zero_in_both_modes() {
        // Wednesday holiday.
        let special = with_holiday(special(), 12);
        let legacy = with_holiday(WorkloadConfig::default(), 12);
        assert_eq!(resolve_workload(&special, "", date(12), None), Ok(0));
        assert_eq!(
            resolve_workload(&special, "", date(12), Some("DEFAULT")),
            Ok(0)
        );
        assert_eq!(resolve_workload(&legacy, "", date(12), None), Ok(0));
    }

    #[test]
    fn test_legacy_mode_ignores_overrides_and_zeroes_leave() {
        let legacy = WorkloadConfig::default();
        assert_eq!(
            resolve_workload(&legacy, "GARAGEM", date(10), Some("not-an-override")),
            Ok(480)
        );
        assert_eq!(resolve_workload(&legacy, "férias", date(10), None), Ok(0));
        assert_eq!(
            resolve_workload(&legacy, "LIC. ÓBITO", date(8), None),
            Ok(0)
        );
    }

    #[test]
    fn test_special_mode_does_not_zero_leave() {
        assert_eq!(
            resolve_workload(&special(), "FÉRIAS", date(10), None),
            Ok(480)
        );
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        for text in ["8:00", "08:30", "13:00", "eight"] {
            assert_eq!(
                resolve_workload(&special(), "GARAGEM", date(10), Some(text)),
                Err(ValidationError::InvalidOverride {
                    value: text.to_string()
                }),
                "{text}"
            );
        }
    }

    #[test]
    fn test_override_aliases() {
        assert_eq!("DEFAULT".parse(), Ok(WorkloadOverride::Default));
        assert_eq!("Padrão".parse(), Ok(WorkloadOverride::Default));
        assert_eq!(" ".parse(), Ok(WorkloadOverride::Default));
        assert_eq!("00:00".parse(), Ok(WorkloadOverride::Hours(0)));
        assert_eq!("12:00".parse(), Ok(WorkloadOverride::Hours(12)));
    }

    #[test]
    fn test_override_above_configured_ceiling() {
        assert_eq!(validate_override("10:00", 12), Ok(WorkloadOverride::Hours(10)));
        assert_eq!(
            validate_override("10:00", 9),
            Err(ValidationError::OverrideAboveLimit {
                value: "10:00".to_string(),
                max_hours: 9
            })
        );
    }

    #[test]
    fn test_overtime_with_override_floors_at_one_day() {
        let config = special();
        assert_eq!(
            resolve_overtime_50(&config, 600, WorkloadOverride::Hours(8), "GARAGEM"),
            120
        );
        assert_eq!(
            resolve_overtime_50(&config, 0, WorkloadOverride::Hours(6), "FÉRIAS"),
            -360
        );
        assert_eq!(
            resolve_overtime_50(&config, -2000, WorkloadOverride::Hours(0), "GARAGEM"),
            -1440
        );
    }

    #[test]
    fn test_overtime_without_override_clamps_at_zero() {
        let config = special();
        assert_eq!(
            resolve_overtime_50(&config, 540, WorkloadOverride::Default, "CARGA/DESCARGA"),
            60
        );
        assert_eq!(
            resolve_overtime_50(&config, 300, WorkloadOverride::Default, "GARAGEM"),
            0
        );
        assert_eq!(
            resolve_overtime_50(&config, 600, WorkloadOverride::Default, "FÉRIAS"),
            0
        );
    }

    #[test]
    fn test_format_workload_renders_whole_hours() {
        assert_eq!(format_workload(0), "00:00");
        assert_eq!(format_workload(240), "04:00");
        assert_eq!(format_workload(510), "08:00");
        assert_eq!(format_workload(720), "12:00");
    }

    #[test]
    fn test_day_workload_credits_depot_journey_per_mode() {
        let legacy = WorkloadConfig::default();
        assert_eq!(
            resolve_day_workload(&legacy, "GARAGEM", date(10), Some("06:00"), 600),
            Ok(DayWorkload {
                workload: 480,
                worked: 480,
                overtime: 120
            })
        );

        let special = special();
        assert_eq!(
            resolve_day_workload(&special, "GARAGEM", date(10), Some("06:00"), 600),
            Ok(DayWorkload {
                workload: 360,
                worked: 600,
                overtime: 240
            })
        );
        assert_eq!(
            resolve_day_workload(&special, "FÉRIAS", date(10), None, 0),
            Ok(DayWorkload {
                workload: 480,
                worked: 0,
                overtime: 0
            })
        );
    }

    #[test]
    fn test_day_workload_without_criterion_uses_journey() {
        let config = WorkloadConfig::default();
        assert_eq!(
            resolve_day_workload(&config, "", date(8), None, 300),
            Ok(DayWorkload {
                workload: 240,
                worked: 300,
                overtime: 60
            })
        );
        // Sundays expect nothing.
        assert_eq!(
            resolve_day_workload(&config, " ", date(9), None, 0),
            Ok(DayWorkload {
                workload: 0,
                worked: 0,
                overtime: 0
            })
        );
    }

    #[test]
    fn test_day_workload_rejects_bad_override_in_special_mode() {
        assert_eq!(
            resolve_day_workload(&special(), "GARAGEM", date(10), Some("7h"), 600),
            Err(ValidationError::InvalidOverride {
                value: "7h".to_string()
            })
        );
    }

    #[test]
    fn test_legacy_overtime_ignores_override() {
        let legacy = WorkloadConfig::default();
        assert_eq!(
            resolve_overtime_50(&legacy, 300, WorkloadOverride::Hours(8), "GARAGEM"),
            0
        );
    }

    #[test]
    fn test_worked_minutes_per_mode() {
        assert_eq!(resolve_worked_minutes(&special(), 555, "garagem"), 555);
        assert_eq!(resolve_worked_minutes(&special(), 555, "FÉRIAS"), 0);
        assert_eq!(
            resolve_worked_minutes(&WorkloadConfig::default(), 555, "GARAGEM"),
            480
        );
    }

    #[test]
    fn test_format_workload() {
        assert_eq!(format_workload(480), "08:00");
        assert_eq!(format_workload(0), "00:00");
    }
}
