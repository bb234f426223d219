//! Workload command: expected hours for a criterion on a date.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use jornada_core::{WorkloadConfig, format_workload, resolve_workload};

/// Resolves and renders the workload line.
///
/// An explicit override wins over the configured table.
pub fn describe(
    config: &WorkloadConfig,
    criterion: &str,
    date: NaiveDate,
    override_text: Option<&str>,
) -> Result<String> {
    let override_text = override_text.or_else(|| config.override_for(criterion));
    let minutes = resolve_workload(config, criterion, date, override_text)
        .with_context(|| format!("cannot resolve workload for {date}"))?;

    let mode = if config.special_workload_enabled {
        "special"
    } else {
        "legacy"
    };
    let criterion = if criterion.trim().is_empty() {
        "-"
    } else {
        criterion
    };
    Ok(format!(
        "{date} ({}) criterion {criterion}: {} [{mode}]",
        date.weekday(),
        format_workload(minutes)
    ))
}

/// Runs the workload command.
pub fn run(
    config: &WorkloadConfig,
    criterion: &str,
    date: NaiveDate,
    override_text: Option<&str>,
) -> Result<()> {
    println!("{}", describe(config, criterion, date, override_text)?);
    Ok(())
}
