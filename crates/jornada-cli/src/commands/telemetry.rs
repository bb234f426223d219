//! Telemetry command: per-day movement and ignition summary.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use jornada_core::clock::{format_clock, format_hhmm};
use jornada_core::{Coordinates, Sample, TelemetryDay, Waypoint, summarize_telemetry_day};

use super::segment::place;
use super::util::read_json;

/// Summarizes each calendar day present in the samples.
pub fn summarize_days(samples: &[Sample]) -> Result<Vec<TelemetryDay>> {
    samples
        .chunk_by(|a, b| a.timestamp.date() == b.timestamp.date())
        .map(|day| {
            summarize_telemetry_day(day)
                .with_context(|| format!("failed to summarize {}", day[0].timestamp.date()))
        })
        .collect()
}

fn coordinates(c: Coordinates) -> String {
    format!("({:.5}, {:.5})", c.latitude, c.longitude)
}

fn span(start: Option<Waypoint>, end: Option<Waypoint>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!(
            "{} {} -> {} {}",
            format_clock(start.time.time()),
            coordinates(start.coordinates),
            format_clock(end.time.time()),
            coordinates(end.coordinates)
        ),
        _ => "-".to_string(),
    }
}

/// Formats the human-readable daily telemetry summary.
pub fn format_days(days: &[TelemetryDay]) -> Result<String> {
    let mut output = String::new();
    for (i, day) in days.iter().enumerate() {
        if i > 0 {
            writeln!(output)?;
        }
        writeln!(output, "{}", day.date)?;
        if let Some(idle) = day.idle_location {
            writeln!(output, "  Idle at {}", coordinates(idle))?;
        } else {
            writeln!(output, "  Movement: {}", span(day.movement_start, day.movement_end))?;
        }
        writeln!(output, "  Ignition: {}", span(day.ignition_start, day.ignition_end))?;
        for stop in &day.stops {
            writeln!(
                output,
                "  Stop {}-{}  {}  {}",
                format_clock(stop.start().time()),
                format_clock(stop.end().time()),
                format_hhmm(stop.duration()),
                place(stop)
            )?;
        }
    }
    Ok(output)
}

/// Runs the telemetry command.
pub fn run(input: &Path, json: bool) -> Result<()> {
    let samples: Vec<Sample> = read_json(input)?;
    let days = summarize_days(&samples)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else {
        print!("{}", format_days(&days)?);
    }

    Ok(())
}
