//! Core domain logic for driver journey control.
//!
//! This crate contains the computations behind journey reports:
//! - Segmentation: turning telemetry samples into WORK/REST segments
//! - Timelines: expanding a day record into gap-free events
//! - Workload: expected hours and 50% overtime per criterion
//! - Infractions: evaluating labor-law limits across a driver's days

pub mod clock;
mod config;
mod day;
mod error;
mod infraction;
mod interval;
pub mod segmenter;
mod timeline;
pub mod workload;

pub use config::{Thresholds, WorkloadConfig};
pub use day::{
    DayRecord, DaySummary, MAX_LOADING_WINDOWS, MAX_REST_WINDOWS, Shift, Window, fill_interstices,
    summarize_day,
};
pub use error::{DayError, InvalidInput, ValidationError};
pub use infraction::{
    DayFailure, DriverBatch, DriverEvaluation, Evaluation, Infraction, InfractionDuration,
    InfractionKind, UnknownInfractionKind, evaluate, evaluate_drivers,
};
pub use interval::Interval;
pub use segmenter::{
    Activity, Coordinates, Ignition, Sample, Segment, SegmentMode, SegmentOptions, Segmentation,
    TelemetryDay, Waypoint, segment, split_by_day, summarize_telemetry_day,
};
pub use timeline::{Event, EventKind, UnknownEventKind, build_timeline};
pub use workload::{
    DayWorkload, WorkloadOverride, format_workload, resolve_day_workload, resolve_overtime_50,
    resolve_worked_minutes, resolve_workload, validate_override,
};
