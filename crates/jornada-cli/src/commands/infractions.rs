//! Infractions command: labor-law evaluation per driver.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use jornada_core::clock::format_clock;
use jornada_core::{DriverBatch, DriverEvaluation, Thresholds, evaluate_drivers};

use super::util::read_json;

/// Formats the human-readable infraction report.
pub fn format_report(results: &[DriverEvaluation]) -> Result<String> {
    let mut output = String::new();

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            writeln!(output)?;
        }
        let count = result.evaluation.infractions.len();
        let noun = if count == 1 { "infraction" } else { "infractions" };
        writeln!(output, "{}: {count} {noun}", result.driver)?;

        for infraction in &result.evaluation.infractions {
            writeln!(
                output,
                "  {} {}  [{}] {:>6}  {}",
                infraction.date,
                format_clock(infraction.time),
                infraction.kind,
                infraction.duration,
                infraction.description
            )?;
        }
        for failure in &result.evaluation.day_errors {
            writeln!(output, "  skipped {}: {}", failure.date, failure.error)?;
        }
    }

    if results.is_empty() {
        writeln!(output, "No drivers.")?;
    }
    Ok(output)
}

/// Runs the infractions command.
pub fn run(input: &Path, thresholds: &Thresholds, json: bool) -> Result<()> {
    let batches: Vec<DriverBatch> = read_json(input)?;
    let results = evaluate_drivers(&batches, thresholds).context("invalid thresholds")?;

    let total: usize = results.iter().map(|r| r.evaluation.infractions.len()).sum();
    tracing::info!(drivers = results.len(), infractions = total, "evaluated");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_report(&results)?);
    }

    Ok(())
}
