//! Error types shared by the segmenter, timeline builder and workload resolver.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::timeline::EventKind;

/// Input that cannot be processed at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// The telemetry batch was empty.
    #[error("no telemetry samples provided")]
    EmptySamples,

    /// A sample is earlier than the one before it.
    #[error("sample {index} at {timestamp} is earlier than the previous sample")]
    UnorderedSamples {
        index: usize,
        timestamp: NaiveDateTime,
    },

    /// The day has a shift start but no shift end.
    #[error("day {date} has a shift start but no shift end")]
    MissingShiftEnd { date: NaiveDate },

    /// The day has no shift at all.
    #[error("day {date} has no shift start")]
    MissingShiftStart { date: NaiveDate },

    /// A window closes before it opens.
    #[error("{kind} window ends at {end} before it starts at {start}")]
    WindowEndsBeforeStart {
        kind: EventKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// A window reaches outside the shift.
    #[error("{kind} window {start}..{end} lies outside the shift {shift_start}..{shift_end}")]
    WindowOutsideShift {
        kind: EventKind,
        start: NaiveDateTime,
        end: NaiveDateTime,
        shift_start: NaiveDateTime,
        shift_end: NaiveDateTime,
    },

    /// Two windows share some time.
    #[error("{kind} window starting at {start} overlaps a window ending at {previous_end}")]
    OverlappingWindows {
        kind: EventKind,
        start: NaiveDateTime,
        previous_end: NaiveDateTime,
    },

    /// More windows of one kind than a day record can hold.
    #[error("{count} {kind} windows given, at most {max} allowed")]
    TooManyWindows {
        kind: EventKind,
        count: usize,
        max: usize,
    },

    /// An interval whose end precedes its start.
    #[error("interval ends at {end} before it starts at {start}")]
    NegativeInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Configuration or override values that fail validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The override is neither `DEFAULT` nor a whole-hour `HH:00` value.
    #[error("invalid workload override {value:?}: expected \"DEFAULT\" or \"HH:00\" between 00:00 and 12:00")]
    InvalidOverride { value: String },

    /// The override exceeds the configured ceiling.
    #[error("workload override {value:?} exceeds the maximum of {max_hours:02}:00")]
    OverrideAboveLimit { value: String, max_hours: u32 },

    /// A threshold that must be positive is zero or negative.
    #[error("threshold {field} must be positive, got {value}")]
    NonPositiveThreshold { field: &'static str, value: i64 },
}

/// Why a single day could not be processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DayError {
    #[error(transparent)]
    Input(#[from] InvalidInput),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
