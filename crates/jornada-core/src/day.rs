//! Manually entered day records and their derived aggregates.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::clock::{self, hhmm_option};
use crate::config::WorkloadConfig;
use crate::error::{DayError, InvalidInput};
use crate::interval::Interval;
use crate::timeline::{Event, EventKind, build_timeline};
use crate::workload::resolve_day_workload;

/// Maximum number of rest windows in one record.
pub const MAX_REST_WINDOWS: usize = 8;

/// Maximum number of loading/unloading windows in one record.
pub const MAX_LOADING_WINDOWS: usize = 7;

/// A start/end pair as typed into the journey form. Either side may be blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    #[serde(default, with = "hhmm_option")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub end: Option<NaiveTime>,
}

impl Window {
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both ends, when the window is fully populated.
    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.start.zip(self.end)
    }
}

/// One driver's journey for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm_option")]
    pub shift_start: Option<NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub shift_end: Option<NaiveTime>,
    #[serde(default)]
    pub meal: Option<Window>,
    #[serde(default)]
    pub rests: Vec<Window>,
    #[serde(default)]
    pub loadings: Vec<Window>,
    /// Free text such as a day-off reason. Annotated days are not journeys.
    #[serde(default)]
    pub annotation: Option<String>,
    /// Rest since the previous shift, as `HH:MM`.
    #[serde(default)]
    pub interstice: Option<String>,
    /// Special criterion for payroll closure (e.g. `GARAGEM`).
    #[serde(default)]
    pub criterion: Option<String>,
    /// Per-day workload override, `DEFAULT` or `HH:00`.
    #[serde(default)]
    pub workload_override: Option<String>,
}

impl DayRecord {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// True when the record describes an actual journey.
    pub fn is_working_day(&self) -> bool {
        let annotated = self
            .annotation
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty());
        !annotated && self.shift_start.is_some()
    }

    /// Resolves the shift against the record's date.
    pub fn shift(&self) -> Result<Shift, InvalidInput> {
        let start = self
            .shift_start
            .ok_or(InvalidInput::MissingShiftStart { date: self.date })?;
        let end = self
            .shift_end
            .ok_or(InvalidInput::MissingShiftEnd { date: self.date })?;
        Ok(Shift::new(self.date, start, end))
    }

    /// Interstice parsed as a duration; `None` when blank or malformed.
    pub fn interstice(&self) -> Option<Duration> {
        self.interstice.as_deref().and_then(clock::parse_hhmm_duration)
    }
}

/// A shift anchored on its calendar date.
///
/// A shift whose end clock time is earlier than its start runs overnight:
/// the end, and any clock time earlier than the start, fall on the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    start_time: NaiveTime,
    overnight: bool,
    interval: Interval,
}

impl Shift {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        let overnight = end < start;
        let start_at = date.and_time(start);
        let mut end_at = date.and_time(end);
        if overnight {
            end_at += Duration::days(1);
        }
        Self {
            start_time: start,
            overnight,
            interval: Interval::from_ordered(start_at, end_at),
        }
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.interval.start()
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.interval.end()
    }

    pub const fn interval(&self) -> Interval {
        self.interval
    }

    pub const fn is_overnight(&self) -> bool {
        self.overnight
    }

    /// Total journey length.
    pub fn span(&self) -> Duration {
        self.interval.duration()
    }

    /// Places a clock time on the shift's timeline.
    pub fn resolve(&self, time: NaiveTime) -> NaiveDateTime {
        let at = self.start().date().and_time(time);
        if self.overnight && time < self.start_time {
            at + Duration::days(1)
        } else {
            at
        }
    }
}

/// Derived aggregates for one working day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub weekday: Weekday,
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub span: Duration,
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub meal: Duration,
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub rest: Duration,
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub loading: Duration,
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub driving: Duration,
    /// Longest WORK event, i.e. driving without any pause.
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub longest_driving: Duration,
    /// Part of the shift inside the 22:00–05:00 night band.
    #[serde(serialize_with = "clock::duration_hhmm::serialize")]
    pub night: Duration,
    pub interstice: Option<String>,
    pub workload_minutes: i64,
    /// Time credited as worked; criterion days follow the workload policy.
    pub worked_minutes: i64,
    pub overtime_minutes: i64,
}

/// Computes the aggregates of a working day.
pub fn summarize_day(day: &DayRecord, config: &WorkloadConfig) -> Result<DaySummary, DayError> {
    let shift = day.shift()?;
    let events = build_timeline(day)?;

    let total = |kind: EventKind| -> Duration {
        events
            .iter()
            .filter(|e| e.kind == kind)
            .map(Event::duration)
            .fold(Duration::zero(), |acc, d| acc + d)
    };
    let longest_driving = events
        .iter()
        .filter(|e| e.kind == EventKind::Work)
        .map(Event::duration)
        .max()
        .unwrap_or_else(Duration::zero);

    let criterion = day.criterion.as_deref().unwrap_or_default();
    let override_text = day
        .workload_override
        .as_deref()
        .or_else(|| config.override_for(criterion));
    let workload = resolve_day_workload(
        config,
        criterion,
        day.date,
        override_text,
        shift.span().num_minutes(),
    )?;

    Ok(DaySummary {
        date: day.date,
        weekday: day.weekday(),
        span: shift.span(),
        meal: total(EventKind::Meal),
        rest: total(EventKind::Rest),
        loading: total(EventKind::Loading),
        driving: total(EventKind::Work),
        longest_driving,
        night: night_overlap(&shift),
        interstice: day.interstice.clone(),
        workload_minutes: workload.workload,
        worked_minutes: workload.worked,
        overtime_minutes: workload.overtime,
    })
}

/// Time of the shift falling between 22:00 and 05:00.
fn night_overlap(shift: &Shift) -> Duration {
    let night_start = NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN);
    let night_end = NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN);
    let day = shift.start().date();

    [day - Duration::days(1), day, day + Duration::days(1)]
        .into_iter()
        .map(|d| (d.and_time(night_start), (d + Duration::days(1)).and_time(night_end)))
        .map(|(start, end)| {
            let overlap_start = start.max(shift.start());
            let overlap_end = end.min(shift.end());
            (overlap_end - overlap_start).max(Duration::zero())
        })
        .fold(Duration::zero(), |acc, d| acc + d)
}

/// Recomputes every working day's interstice from the previous working day.
///
/// The interstice is the time between the previous working day's shift end
/// and this day's shift start. The first working day, and any day whose
/// predecessor has no usable shift, gets `00:00`.
pub fn fill_interstices(days: &mut [DayRecord]) {
    let mut previous_end: Option<NaiveDateTime> = None;
    for day in days.iter_mut().filter(|d| d.is_working_day()) {
        let shift = day.shift().ok();
        let interstice = match (previous_end, shift) {
            (Some(end), Some(shift)) => (shift.start() - end).abs(),
            _ => Duration::zero(),
        };
        day.interstice = Some(clock::format_hhmm(interstice));
        previous_end = shift.map(|s| s.end());
    }
}
