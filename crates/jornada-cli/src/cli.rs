//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use jornada_core::SegmentMode;

/// Driver journey control.
///
/// Segments vehicle telemetry into work and rest, builds daily timelines and
/// checks them against labor-law limits.
#[derive(Debug, Parser)]
#[command(name = "jornada", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split telemetry samples into work and rest segments.
    Segment {
        /// JSON file with an array of samples.
        #[arg(short, long)]
        input: PathBuf,

        /// Signal used to tell work from rest.
        #[arg(long, value_enum, default_value_t = ModeArg::Speed)]
        mode: ModeArg,

        /// Drop rest before the first and after the last work segment.
        #[arg(long)]
        drop_idle_edges: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize telemetry per calendar day (movement, ignition, stops).
    Telemetry {
        /// JSON file with an array of samples.
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the event timeline of each working day.
    Timeline {
        /// JSON file with an array of day records.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Evaluate labor-law infractions for one or more drivers.
    Infractions {
        /// JSON file with an array of `{ "driver": ..., "days": [...] }`.
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve the expected workload for a criterion on a date.
    Workload {
        /// Closure criterion, e.g. GARAGEM.
        #[arg(long, default_value = "")]
        criterion: String,

        /// Date (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,

        /// Override as HH:00 or DEFAULT. Falls back to the configured table.
        #[arg(long = "override")]
        override_: Option<String>,
    },

    /// Per-day closure aggregates with workload and overtime.
    Closure {
        /// JSON file with an array of day records.
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Segmentation strategy accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Speed,
    Ignition,
}

impl From<ModeArg> for SegmentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Speed => Self::Speed,
            ModeArg::Ignition => Self::Ignition,
        }
    }
}
