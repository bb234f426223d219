//! Closure command: per-day aggregates for payroll closure.
//!
//! Interstices are recomputed from the shifts before summarizing, so the
//! input does not need to carry them.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use chrono::Duration;
use jornada_core::clock::{format_hhmm, format_minutes};
use jornada_core::{DayFailure, DayRecord, DaySummary, WorkloadConfig, fill_interstices, summarize_day};
use serde::Serialize;

use super::util::read_json;

/// Closure output.
#[derive(Debug, Serialize)]
pub struct Closure {
    pub days: Vec<DaySummary>,
    pub errors: Vec<DayFailure>,
}

/// Sorts, deduplicates and summarizes the working days.
pub fn compute(mut records: Vec<DayRecord>, config: &WorkloadConfig) -> Closure {
    records.sort_by_key(|d| d.date);
    records.dedup_by_key(|d| d.date);
    fill_interstices(&mut records);

    let mut closure = Closure {
        days: Vec::new(),
        errors: Vec::new(),
    };
    for record in records.iter().filter(|d| d.is_working_day()) {
        match summarize_day(record, config) {
            Ok(summary) => closure.days.push(summary),
            Err(error) => {
                tracing::warn!(date = %record.date, %error, "skipping day");
                closure.errors.push(DayFailure {
                    date: record.date,
                    error,
                });
            }
        }
    }
    closure
}

fn row(output: &mut String, cells: [&str; 12]) -> std::fmt::Result {
    let [date, day, span, drive, meal, rest, load, night, interstice, workload, worked, overtime] =
        cells;
    writeln!(
        output,
        "{date:<10}  {day:<3}  {span:>6}  {drive:>6}  {meal:>6}  {rest:>6}  {load:>6}  {night:>6}  {interstice:>8}  {workload:>8}  {worked:>8}  {overtime:>7}"
    )
}

/// Formats the closure table.
pub fn format_closure(closure: &Closure) -> Result<String> {
    let mut output = String::new();
    row(
        &mut output,
        [
            "DATE", "DAY", "SPAN", "DRIVE", "MEAL", "REST", "LOAD", "NIGHT", "INTERST", "WORKLOAD",
            "WORKED", "OT 50%",
        ],
    )?;

    for day in &closure.days {
        row(
            &mut output,
            [
                &day.date.to_string(),
                &day.weekday.to_string(),
                &format_hhmm(day.span),
                &format_hhmm(day.driving),
                &format_hhmm(day.meal),
                &format_hhmm(day.rest),
                &format_hhmm(day.loading),
                &format_hhmm(day.night),
                day.interstice.as_deref().unwrap_or("-"),
                &format_minutes(day.workload_minutes),
                &format_minutes(day.worked_minutes),
                &format_minutes(day.overtime_minutes),
            ],
        )?;
    }

    let sum = |f: fn(&DaySummary) -> Duration| {
        format_hhmm(
            closure
                .days
                .iter()
                .map(f)
                .fold(Duration::zero(), |acc, d| acc + d),
        )
    };
    let workload: i64 = closure.days.iter().map(|d| d.workload_minutes).sum();
    let worked: i64 = closure.days.iter().map(|d| d.worked_minutes).sum();
    let overtime: i64 = closure.days.iter().map(|d| d.overtime_minutes).sum();
    row(
        &mut output,
        [
            "TOTAL",
            "",
            &sum(|d| d.span),
            &sum(|d| d.driving),
            &sum(|d| d.meal),
            &sum(|d| d.rest),
            &sum(|d| d.loading),
            &sum(|d| d.night),
            "",
            &format_minutes(workload),
            &format_minutes(worked),
            &format_minutes(overtime),
        ],
    )?;

    for failure in &closure.errors {
        writeln!(output, "skipped {}: {}", failure.date, failure.error)?;
    }
    Ok(output)
}

/// Runs the closure command.
pub fn run(input: &Path, config: &WorkloadConfig, json: bool) -> Result<()> {
    let records: Vec<DayRecord> = read_json(input)?;
    let closure = compute(records, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&closure)?);
    } else {
        print!("{}", format_closure(&closure)?);
    }

    Ok(())
}
