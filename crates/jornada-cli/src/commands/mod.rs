//! CLI subcommand implementations.

pub mod closure;
pub mod infractions;
pub mod segment;
pub mod telemetry;
pub mod timeline;
mod util;
pub mod workload;
