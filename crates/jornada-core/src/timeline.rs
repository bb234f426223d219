//! Day timeline construction.
//!
//! Expands a day record into a chronological, gap-free list of events: the
//! explicit meal/rest/loading windows, with WORK events synthesized for every
//! stretch of the shift they do not cover.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::day::{DayRecord, MAX_LOADING_WINDOWS, MAX_REST_WINDOWS, Shift, Window};
use crate::error::InvalidInput;
use crate::interval::Interval;

/// What a timeline event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Work,
    Meal,
    Rest,
    Loading,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Meal => "meal",
            Self::Rest => "rest",
            Self::Loading => "loading",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "trabalho" => Ok(Self::Work),
            "meal" | "refeicao" => Ok(Self::Meal),
            "rest" | "descanso" => Ok(Self::Rest),
            "loading" | "carga_descarga" => Ok(Self::Loading),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event kind strings.
#[derive(Debug, Clone)]
pub struct UnknownEventKind(String);

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for UnknownEventKind {}

/// One named window of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    #[serde(flatten)]
    pub interval: Interval,
}

impl Event {
    pub const fn start(&self) -> NaiveDateTime {
        self.interval.start()
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.interval.end()
    }

    pub fn duration(&self) -> Duration {
        self.interval.duration()
    }

    pub fn is_work(&self) -> bool {
        self.kind == EventKind::Work
    }
}

/// Build the timeline of a working day.
///
/// # Algorithm
///
/// 1. Resolve the shift (overnight shifts roll onto the next day)
/// 2. Collect every fully populated meal, rest and loading window
/// 3. Sort windows by start (ties keep meal, rest, loading order)
/// 4. Walk them with a cursor starting at the shift start, emitting a WORK
///    event for every positive gap before the next window
/// 5. Close with a WORK event up to the shift end when time remains
///
/// The result covers exactly `[shift_start, shift_end]` with no gaps or
/// overlaps.
pub fn build_timeline(day: &DayRecord) -> Result<Vec<Event>, InvalidInput> {
    let shift = day.shift()?;
    let windows = collect_windows(day, &shift)?;

    let mut events = Vec::with_capacity(windows.len() * 2 + 1);
    let mut cursor = shift.start();

    for window in windows {
        if window.start() < cursor {
            return Err(InvalidInput::OverlappingWindows {
                kind: window.kind,
                start: window.start(),
                previous_end: cursor,
            });
        }
        if window.start() > cursor {
            events.push(Event {
                kind: EventKind::Work,
                interval: Interval::from_ordered(cursor, window.start()),
            });
        }
        cursor = window.end();
        events.push(window);
    }

    if cursor < shift.end() {
        events.push(Event {
            kind: EventKind::Work,
            interval: Interval::from_ordered(cursor, shift.end()),
        });
    }

    tracing::trace!(date = %day.date, events = events.len(), "built timeline");
    Ok(events)
}

fn collect_windows(day: &DayRecord, shift: &Shift) -> Result<Vec<Event>, InvalidInput> {
    check_slot_count(EventKind::Rest, day.rests.len(), MAX_REST_WINDOWS)?;
    check_slot_count(EventKind::Loading, day.loadings.len(), MAX_LOADING_WINDOWS)?;

    let labelled = day
        .meal
        .iter()
        .map(|w| (EventKind::Meal, w))
        .chain(day.rests.iter().map(|w| (EventKind::Rest, w)))
        .chain(day.loadings.iter().map(|w| (EventKind::Loading, w)));

    let mut windows = Vec::new();
    for (kind, window) in labelled {
        if let Some(event) = place_window(kind, window, shift)? {
            windows.push(event);
        }
    }
    windows.sort_by_key(Event::start);
    Ok(windows)
}

const fn check_slot_count(kind: EventKind, count: usize, max: usize) -> Result<(), InvalidInput> {
    if count > max {
        return Err(InvalidInput::TooManyWindows { kind, count, max });
    }
    Ok(())
}

/// Places a populated window on the shift; blank windows are skipped.
fn place_window(
    kind: EventKind,
    window: &Window,
    shift: &Shift,
) -> Result<Option<Event>, InvalidInput> {
    let Some((start, end)) = window.bounds() else {
        return Ok(None);
    };
    let start = shift.resolve(start);
    let end = shift.resolve(end);

    if end < start {
        return Err(InvalidInput::WindowEndsBeforeStart { kind, start, end });
    }
    if start < shift.start() || end > shift.end() {
        return Err(InvalidInput::WindowOutsideShift {
            kind,
            start,
            end,
            shift_start: shift.start(),
            shift_end: shift.end(),
        });
    }

    Ok(Some(Event {
        kind,
        interval: Interval::from_ordered(start, end),
    }))
}
