use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jornada_cli::commands::{closure, infractions, segment, telemetry, timeline, workload};
use jornada_cli::{Cli, Commands, Config};
use jornada_core::SegmentOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let load_config = || -> Result<Config> {
        let config =
            Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    };

    match &cli.command {
        Some(Commands::Segment {
            input,
            mode,
            drop_idle_edges,
            json,
        }) => {
            let options = SegmentOptions {
                mode: (*mode).into(),
                drop_pre_post_rest: *drop_idle_edges,
            };
            segment::run(input, options, *json)?;
        }
        Some(Commands::Telemetry { input, json }) => {
            telemetry::run(input, *json)?;
        }
        Some(Commands::Timeline { input }) => {
            timeline::run(input)?;
        }
        Some(Commands::Infractions { input, json }) => {
            let config = load_config()?;
            infractions::run(input, &config.thresholds, *json)?;
        }
        Some(Commands::Workload {
            criterion,
            date,
            override_,
        }) => {
            let config = load_config()?;
            workload::run(&config.workload, criterion, *date, override_.as_deref())?;
        }
        Some(Commands::Closure { input, json }) => {
            let config = load_config()?;
            closure::run(input, &config.workload, *json)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
