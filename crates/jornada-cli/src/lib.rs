//! Journey control CLI library.
//!
//! This crate provides the CLI interface over `jornada-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ModeArg};
pub use config::Config;
