//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;

/// Interactive controller for a fleet of simulated robot units.
#[derive(Parser, Debug)]
#[command(name = "robot_fleet", version, about, long_about = None)]
pub struct Cli {
    /// Largest reachable x coordinate
    #[arg(
        long,
        env = "FLEET_MAX_X",
        default_value_t = 10,
        value_parser = clap::value_parser!(i32).range(0..=200)
    )]
    pub max_x: i32,

    /// Largest reachable y coordinate
    #[arg(
        long,
        env = "FLEET_MAX_Y",
        default_value_t = 10,
        value_parser = clap::value_parser!(i32).range(0..=200)
    )]
    pub max_y: i32,

    /// Travel time of a single step, in milliseconds
    #[arg(long, env = "FLEET_STEP_DELAY_MS", default_value_t = 1000)]
    pub step_delay_ms: u64,

    /// How long `q` waits for units to confirm termination, in milliseconds
    #[arg(long, env = "FLEET_SHUTDOWN_GRACE_MS", default_value_t = 3000)]
    pub shutdown_grace_ms: u64,

    /// Diagnostic log filter (trace, debug, info, warn, error)
    #[arg(long, env = "FLEET_LOG", default_value = "warn")]
    pub log_level: String,

    /// Do not print grid frames
    #[arg(long, env = "FLEET_NO_GRID")]
    pub no_grid: bool,
}

/// Runtime settings shared by the controller, units, and visualizer.
#[derive(Clone, Debug)]
pub struct FleetConfig {
    pub max_x: i32,
    pub max_y: i32,
    pub step_delay: Duration,
    pub shutdown_grace: Duration,
    pub show_grid: bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_x: 10,
            max_y: 10,
            step_delay: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(3),
            show_grid: true,
        }
    }
}

impl From<&Cli> for FleetConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            max_x: cli.max_x,
            max_y: cli.max_y,
            step_delay: Duration::from_millis(cli.step_delay_ms),
            shutdown_grace: Duration::from_millis(cli.shutdown_grace_ms),
            show_grid: !cli.no_grid,
        }
    }
}
