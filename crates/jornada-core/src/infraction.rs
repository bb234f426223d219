//! Labor-law infraction engine.
//!
//! Walks a driver's working days in date order and reports every breach of
//! the configured [`Thresholds`]. Per-day rules look at one record at a time;
//! the driving-rest rule folds a small state machine over each day's
//! timeline; the consecutive-day and weekly rules carry a run across days.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};

use crate::clock::{self, hhmm};
use crate::config::Thresholds;
use crate::day::{DayRecord, Shift};
use crate::error::{DayError, ValidationError};
use crate::timeline::{Event, EventKind, build_timeline};

/// The fixed infraction taxonomy. Codes start at 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InfractionKind {
    /// Meal break shorter than the minimum.
    ShortMeal,
    /// Shift longer than the daily maximum.
    DailySpan,
    /// Too little rest since the previous shift.
    ShortInterstice,
    /// Driving cap reached without enough rest in between.
    DrivingRest,
    /// Too many consecutive working days.
    ConsecutiveDays,
    /// Too many hours worked in one run.
    WeeklyHours,
    /// Weekly rest shorter than the minimum.
    WeeklyRest,
}

impl InfractionKind {
    pub const ALL: [Self; 7] = [
        Self::ShortMeal,
        Self::DailySpan,
        Self::ShortInterstice,
        Self::DrivingRest,
        Self::ConsecutiveDays,
        Self::WeeklyHours,
        Self::WeeklyRest,
    ];

    pub const fn code(self) -> u8 {
        match self {
            Self::ShortMeal => 2,
            Self::DailySpan => 3,
            Self::ShortInterstice => 4,
            Self::DrivingRest => 5,
            Self::ConsecutiveDays => 6,
            Self::WeeklyHours => 7,
            Self::WeeklyRest => 8,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::ShortMeal),
            3 => Some(Self::DailySpan),
            4 => Some(Self::ShortInterstice),
            5 => Some(Self::DrivingRest),
            6 => Some(Self::ConsecutiveDays),
            7 => Some(Self::WeeklyHours),
            8 => Some(Self::WeeklyRest),
            _ => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::ShortMeal => "Insufficient meal break.",
            Self::DailySpan => "Total daily journey longer than allowed (maximum 13 hours).",
            Self::ShortInterstice => "Insufficient rest between journeys (minimum 8 hours).",
            Self::DrivingRest => {
                "Insufficient rest for every 5h30 of driving (30 minutes required, may be fragmented)."
            }
            Self::ConsecutiveDays => "Maximum consecutive working days exceeded (maximum 6 days).",
            Self::WeeklyHours => "Maximum weekly worked hours exceeded (maximum 72 hours).",
            Self::WeeklyRest => "Weekly rest not taken (minimum 35 uninterrupted hours).",
        }
    }
}

impl fmt::Display for InfractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for InfractionKind {
    type Err = UnknownInfractionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_code)
            .ok_or_else(|| UnknownInfractionKind(s.to_string()))
    }
}

impl Serialize for InfractionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for InfractionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown infraction code: {code}")))
    }
}

/// Error type for unknown infraction codes.
#[derive(Debug, Clone)]
pub struct UnknownInfractionKind(String);

impl fmt::Display for UnknownInfractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown infraction code: {}", self.0)
    }
}

impl std::error::Error for UnknownInfractionKind {}

/// How much of something an infraction measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfractionDuration {
    /// Rendered as `HH:MM`.
    Elapsed(Duration),
    /// A day count, rendered as a bare integer.
    Days(u32),
}

impl fmt::Display for InfractionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed(d) => f.pad(&clock::format_hhmm(*d)),
            Self::Days(n) => f.pad(&n.to_string()),
        }
    }
}

impl Serialize for InfractionDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Elapsed(d) => serializer.serialize_str(&clock::format_hhmm(*d)),
            Self::Days(n) => serializer.serialize_u32(*n),
        }
    }
}

/// One detected breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Infraction {
    #[serde(rename = "type")]
    pub kind: InfractionKind,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub duration: InfractionDuration,
    pub description: &'static str,
}

impl Infraction {
    fn new(
        kind: InfractionKind,
        date: NaiveDate,
        at: NaiveDateTime,
        duration: InfractionDuration,
    ) -> Self {
        Self {
            kind,
            date,
            time: at.time(),
            duration,
            description: kind.description(),
        }
    }
}

/// A day that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayFailure {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_display")]
    pub error: DayError,
}

fn serialize_display<S>(error: &DayError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(error)
}

/// Result of evaluating one driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// Ascending by date; within a day in rule order.
    pub infractions: Vec<Infraction>,
    /// Days skipped because their timeline could not be built.
    pub day_errors: Vec<DayFailure>,
}

/// Accumulators of the fragmented driving-rest rule.
///
/// `work` counts driving since the last threshold check and `rest` the
/// pauses taken since driving began. Both reset after every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrivingRest {
    work: Duration,
    rest: Duration,
}

/// A threshold check that found too little rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DrivingBreach {
    at: NaiveDateTime,
    rest: Duration,
}

impl DrivingRest {
    const fn new() -> Self {
        Self {
            work: Duration::zero(),
            rest: Duration::zero(),
        }
    }

    /// Advances the state by one timeline event.
    fn step(self, event: &Event, cap: Duration, rest_min: Duration) -> (Self, Vec<DrivingBreach>) {
        if !event.is_work() {
            let rest = if self.work > Duration::zero() {
                self.rest + event.duration()
            } else {
                event.duration()
            };
            return (Self { rest, ..self }, Vec::new());
        }

        let mut state = self;
        let mut breaches = Vec::new();
        let mut cursor = event.start();
        let mut unconsumed = event.duration();

        loop {
            let remaining = cap - state.work;
            if unconsumed <= remaining {
                state.work += unconsumed;
                break;
            }
            cursor += remaining;
            unconsumed -= remaining;
            if state.rest < rest_min {
                breaches.push(DrivingBreach {
                    at: cursor,
                    rest: state.rest,
                });
            }
            state = Self::new();
        }

        (state, breaches)
    }

    /// The end-of-day check, for driving that reached the cap exactly.
    fn finish(self, last_end: NaiveDateTime, cap: Duration, rest_min: Duration) -> Option<DrivingBreach> {
        (self.work >= cap && self.rest < rest_min).then_some(DrivingBreach {
            at: last_end,
            rest: self.rest,
        })
    }
}

fn driving_rest_breaches(events: &[Event], thresholds: &Thresholds) -> Vec<DrivingBreach> {
    let cap = thresholds.continuous_driving_max();
    let rest_min = thresholds.driving_rest_min();

    let (state, mut breaches) = events.iter().fold(
        (DrivingRest::new(), Vec::new()),
        |(state, mut found), event| {
            let (next, new) = state.step(event, cap, rest_min);
            found.extend(new);
            (next, found)
        },
    );
    if let Some(last) = events.last() {
        breaches.extend(state.finish(last.end(), cap, rest_min));
    }
    breaches
}

/// Run of consecutive working days.
#[derive(Debug, Clone, Copy)]
struct Run {
    last_date: NaiveDate,
    consecutive_days: u32,
    worked: Duration,
}

impl Run {
    const fn start(date: NaiveDate, worked: Duration) -> Self {
        Self {
            last_date: date,
            consecutive_days: 1,
            worked,
        }
    }

    fn continues_to(&self, date: NaiveDate) -> bool {
        (date - self.last_date).num_days() <= 1
    }
}

/// Evaluates one driver's days.
///
/// Records are sorted by date and deduplicated (the first record for a date
/// wins). Days that are not journeys are skipped silently; days whose
/// timeline cannot be built are reported in [`Evaluation::day_errors`].
/// Either kind of skipped day breaks a run of consecutive days.
pub fn evaluate(days: &[DayRecord], thresholds: &Thresholds) -> Result<Evaluation, ValidationError> {
    thresholds.validate()?;

    let mut by_date: BTreeMap<NaiveDate, &DayRecord> = BTreeMap::new();
    for day in days {
        by_date.entry(day.date).or_insert(day);
    }

    let mut evaluation = Evaluation::default();
    let mut run: Option<Run> = None;

    for day in by_date.into_values().filter(|d| d.is_working_day()) {
        let (shift, events) = match day.shift().and_then(|s| Ok((s, build_timeline(day)?))) {
            Ok(parts) => parts,
            Err(error) => {
                tracing::warn!(date = %day.date, %error, "skipping day");
                evaluation.day_errors.push(DayFailure {
                    date: day.date,
                    error: error.into(),
                });
                continue;
            }
        };

        let found = &mut evaluation.infractions;
        found.extend(meal_infraction(day, &events, thresholds));
        found.extend(daily_span_infraction(day, &shift, thresholds));
        found.extend(
            driving_rest_breaches(&events, thresholds)
                .into_iter()
                .map(|b| {
                    Infraction::new(
                        InfractionKind::DrivingRest,
                        day.date,
                        b.at,
                        InfractionDuration::Elapsed(b.rest),
                    )
                }),
        );
        found.extend(interstice_infraction(day, &shift, thresholds));

        run = Some(match run {
            Some(previous) if previous.continues_to(day.date) => {
                continue_run(previous, day, &shift, thresholds, found)
            }
            Some(_) => {
                found.extend(weekly_rest_infraction(day, &shift, thresholds));
                Run::start(day.date, shift.span())
            }
            None => Run::start(day.date, shift.span()),
        });
    }

    tracing::debug!(
        infractions = evaluation.infractions.len(),
        skipped = evaluation.day_errors.len(),
        "evaluation complete"
    );
    Ok(evaluation)
}

fn continue_run(
    previous: Run,
    day: &DayRecord,
    shift: &Shift,
    thresholds: &Thresholds,
    found: &mut Vec<Infraction>,
) -> Run {
    let run = Run {
        last_date: day.date,
        consecutive_days: previous.consecutive_days + 1,
        worked: previous.worked + shift.span(),
    };
    if run.consecutive_days > thresholds.consecutive_days_max {
        found.push(Infraction::new(
            InfractionKind::ConsecutiveDays,
            day.date,
            shift.end(),
            InfractionDuration::Days(run.consecutive_days),
        ));
    }
    if run.worked > thresholds.weekly_work_max() {
        found.push(Infraction::new(
            InfractionKind::WeeklyHours,
            day.date,
            shift.end(),
            InfractionDuration::Elapsed(run.worked),
        ));
    }
    run
}

fn meal_infraction(day: &DayRecord, events: &[Event], thresholds: &Thresholds) -> Option<Infraction> {
    let meal = events.iter().find(|e| e.kind == EventKind::Meal)?;
    (meal.duration() < thresholds.meal_min()).then(|| {
        Infraction::new(
            InfractionKind::ShortMeal,
            day.date,
            meal.start(),
            InfractionDuration::Elapsed(meal.duration()),
        )
    })
}

fn daily_span_infraction(day: &DayRecord, shift: &Shift, thresholds: &Thresholds) -> Option<Infraction> {
    (shift.span() > thresholds.daily_span_max()).then(|| {
        Infraction::new(
            InfractionKind::DailySpan,
            day.date,
            shift.end(),
            InfractionDuration::Elapsed(shift.span()),
        )
    })
}

fn interstice_infraction(day: &DayRecord, shift: &Shift, thresholds: &Thresholds) -> Option<Infraction> {
    let interstice = day.interstice().filter(|d| !d.is_zero())?;
    (interstice < thresholds.interstice_min()).then(|| {
        Infraction::new(
            InfractionKind::ShortInterstice,
            day.date,
            shift.start(),
            InfractionDuration::Elapsed(interstice),
        )
    })
}

/// Checks the rest that preceded a new run.
///
/// The reset day's own interstice is taken as the weekly rest, since it
/// measures the time from the previous journey's end to this one's start.
fn weekly_rest_infraction(day: &DayRecord, shift: &Shift, thresholds: &Thresholds) -> Option<Infraction> {
    let rest = day.interstice()?;
    (rest < thresholds.weekly_rest_min()).then(|| {
        Infraction::new(
            InfractionKind::WeeklyRest,
            day.date,
            shift.start(),
            InfractionDuration::Elapsed(rest),
        )
    })
}

/// One driver's days, as handed to [`evaluate_drivers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverBatch {
    pub driver: String,
    #[serde(default)]
    pub days: Vec<DayRecord>,
}

/// One driver's evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverEvaluation {
    pub driver: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Evaluates many drivers in parallel. Results keep the input order.
pub fn evaluate_drivers(
    batches: &[DriverBatch],
    thresholds: &Thresholds,
) -> Result<Vec<DriverEvaluation>, ValidationError> {
    thresholds.validate()?;
    batches
        .par_iter()
        .map(|batch| {
            let span = tracing::debug_span!("driver", driver = %batch.driver);
            let _enter = span.enter();
            evaluate(&batch.days, thresholds).map(|evaluation| DriverEvaluation {
                driver: batch.driver.clone(),
                evaluation,
            })
        })
        .collect()
}
