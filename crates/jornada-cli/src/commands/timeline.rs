//! Timeline command: the event list of each working day.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use jornada_core::clock::{format_clock, format_hhmm};
use jornada_core::{DayRecord, build_timeline};

use super::util::read_json;

/// Formats every working day's timeline. Days that fail are reported inline.
pub fn format_timelines(days: &[DayRecord]) -> Result<String> {
    let mut output = String::new();
    let mut first = true;

    for day in days.iter().filter(|d| d.is_working_day()) {
        if !first {
            writeln!(output)?;
        }
        first = false;

        writeln!(output, "{} ({})", day.date, day.weekday())?;
        match build_timeline(day) {
            Ok(events) => {
                for event in events {
                    writeln!(
                        output,
                        "  {:<7}  {}-{}  {}",
                        event.kind,
                        format_clock(event.start().time()),
                        format_clock(event.end().time()),
                        format_hhmm(event.duration())
                    )?;
                }
            }
            Err(err) => writeln!(output, "  error: {err}")?,
        }
    }

    if first {
        writeln!(output, "No working days.")?;
    }
    Ok(output)
}

/// Runs the timeline command.
pub fn run(input: &Path) -> Result<()> {
    let mut days: Vec<DayRecord> = read_json(input)?;
    days.sort_by_key(|d| d.date);
    print!("{}", format_timelines(&days)?);
    Ok(())
}
