mod command;
mod config;
mod controller;
mod error;
mod logging;
mod reaper;
mod registry;
mod types;
mod visualizer;
mod worker;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::config::{Cli, FleetConfig};
use crate::controller::Controller;
use crate::error::FleetError;
use crate::logging::{Console, StdConsole};

fn critical(err: &FleetError) -> ! {
    eprintln!("CRIT_ERR: {err}");
    std::process::exit(1);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);
    let config = FleetConfig::from(&cli);
    debug!(?config, "configuration loaded");

    let console: Arc<dyn Console> = Arc::new(StdConsole);
    let ansi = config.show_grid && visualizer::stdout_is_terminal();
    let controller =
        Controller::start(config, console, ansi).unwrap_or_else(|err| critical(&err));

    let stdin = std::io::stdin();
    // Units are already shut down when `run` returns an error.
    let report = controller.run(stdin.lock()).unwrap_or_else(|err| critical(&err));
    if let Some(grid) = report.grid {
        debug!(drained = report.drained, "final field:\n{}", grid.render());
    }
    Ok(())
}
