//! Segment command: telemetry samples to WORK/REST segments.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use jornada_core::clock::{format_clock, format_hhmm};
use jornada_core::{
    Activity, Sample, Segment, SegmentMode, SegmentOptions, Segmentation, segment, split_by_day,
};

use super::util::read_json;

const fn mode_label(mode: SegmentMode) -> &'static str {
    match mode {
        SegmentMode::Speed => "speed",
        SegmentMode::Ignition => "ignition",
    }
}

/// City and street of a segment, `-` when unknown.
pub fn place(segment: &Segment) -> String {
    let parts: Vec<&str> = [segment.city.as_str(), segment.street.as_str()]
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

/// Formats the human-readable segment listing, grouped by calendar day.
pub fn format_segments(segmentation: &Segmentation, mode: SegmentMode) -> Result<String> {
    let mut output = String::new();
    writeln!(output, "SEGMENTS ({})", mode_label(mode))?;

    let mut current: Option<NaiveDate> = None;
    for piece in segmentation.segments.iter().flat_map(split_by_day) {
        let date = piece.start().date();
        if current != Some(date) {
            writeln!(output)?;
            writeln!(output, "{date}")?;
            current = Some(date);
        }
        writeln!(
            output,
            "  {:<4}  {}-{}  {}  {}",
            piece.activity,
            format_clock(piece.start().time()),
            format_clock(piece.end().time()),
            format_hhmm(piece.duration()),
            place(&piece)
        )?;
    }

    writeln!(output)?;
    match (segmentation.first_work_start, segmentation.last_work_end) {
        (Some(start), Some(end)) => writeln!(
            output,
            "Work: {} -> {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        )?,
        _ => writeln!(output, "No work detected.")?,
    }

    let total = |activity: Activity| {
        segmentation
            .segments
            .iter()
            .filter(|s| s.activity == activity)
            .fold(Duration::zero(), |acc, s| acc + s.duration())
    };
    writeln!(
        output,
        "Total work {}, rest {}",
        format_hhmm(total(Activity::Work)),
        format_hhmm(total(Activity::Rest))
    )?;

    Ok(output)
}

/// Runs the segment command.
pub fn run(input: &Path, options: SegmentOptions, json: bool) -> Result<()> {
    let samples: Vec<Sample> = read_json(input)?;
    let segmentation = segment(&samples, &options).context("failed to segment samples")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&segmentation)?);
    } else {
        print!("{}", format_segments(&segmentation, options.mode)?);
    }

    Ok(())
}
