//! Operator-facing controller: owns the fleet and routes commands.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::command::{Command, HELP_TEXT};
use crate::config::FleetConfig;
use crate::error::{DispatchError, FleetError};
use crate::logging::Console;
use crate::reaper;
use crate::registry::Registry;
use crate::types::{Directive, WorkerId, unit_number};
use crate::visualizer::{self, OccupancyGrid};
use crate::worker::{self, UnitLinks};

/// Outcome of `q`.
pub struct ShutdownReport {
    /// Every unit confirmed termination within the grace period.
    pub drained: bool,
    /// Final field, available once the visualizer has finished.
    pub grid: Option<OccupancyGrid>,
}

pub struct Controller {
    registry: Arc<Registry>,
    links: UnitLinks,
    console: Arc<dyn Console>,
    config: FleetConfig,
    visualizer: JoinHandle<OccupancyGrid>,
    reaper: JoinHandle<()>,
}

impl Controller {
    /// Create the shared channels and start the visualizer and reaper.
    pub fn start(
        config: FleetConfig,
        console: Arc<dyn Console>,
        ansi: bool,
    ) -> Result<Self, FleetError> {
        let registry = Arc::new(Registry::new());
        let (positions, positions_rx) = mpsc::channel();
        let (exits, exits_rx) = mpsc::channel();
        let visualizer = visualizer::spawn(&config, Arc::clone(&console), ansi, positions_rx)?;
        let reaper = reaper::spawn(Arc::clone(&registry), Arc::clone(&console), exits_rx)?;
        info!(max_x = config.max_x, max_y = config.max_y, "fleet controller started");
        Ok(Self {
            registry,
            links: UnitLinks {
                positions,
                exits,
                console: Arc::clone(&console),
            },
            console,
            config,
            visualizer,
            reaper,
        })
    }

    /// Start a new unit at the origin.
    pub fn create_worker(&self) -> Result<WorkerId, FleetError> {
        let (id, active) = self
            .registry
            .register(|id| worker::spawn(id, &self.links, &self.config))?;
        self.console
            .info(&format!("New unit created ({active} total)."));
        Ok(id)
    }

    /// Forward a directive to unit `unit` (1-based) without waiting for it.
    pub fn dispatch(&self, unit: usize, directive: Directive) -> Result<WorkerId, DispatchError> {
        let (id, commands) = self.registry.command_channel(unit)?;
        debug!(unit, ?directive, "dispatching directive");
        commands
            .send(directive)
            .map_err(|_| DispatchError::Terminated { id })?;
        Ok(id)
    }

    /// Print the active units and their count.
    pub fn status(&self) -> Vec<WorkerId> {
        let active = self.registry.active_ids();
        let listed: String = active
            .iter()
            .map(|id| format!("{} ", unit_number(*id)))
            .collect();
        self.console
            .info(&format!("Active units: {listed}({} total).", active.len()));
        active
    }

    pub fn help(&self) {
        self.console.raw(&format!("{HELP_TEXT}\n"));
    }

    /// Kill every active unit, release the shared channels, and wait up to the
    /// configured grace period for the reaper to retire them all.
    pub fn shutdown(self) -> ShutdownReport {
        let Controller {
            registry,
            links,
            console,
            config,
            visualizer,
            reaper,
        } = self;
        let killed = registry.kill_all();
        debug!(killed, "kill sent to active units");
        drop(links);

        let drained = registry.wait_drained(config.shutdown_grace);
        let grid = if drained {
            if reaper.join().is_err() {
                warn!("reaper thread panicked");
            }
            visualizer.join().ok()
        } else {
            warn!(
                remaining = registry.active_count(),
                "units did not confirm termination before exit"
            );
            None
        };
        console.info("Goodbye.");
        ShutdownReport { drained, grid }
    }

    fn select<R: BufRead>(
        &self,
        unit: usize,
        inline: Option<String>,
        input: &mut R,
    ) -> Result<(), FleetError> {
        if let Err(err) = self.registry.command_channel(unit) {
            self.console.error(&err.to_string());
            return Ok(());
        }
        let raw = match inline {
            Some(raw) => raw,
            None => {
                self.console
                    .info(&format!("Enter directive for unit {unit}."));
                match read_line(input)? {
                    Some(line) => line,
                    None => return Ok(()),
                }
            }
        };
        if let Err(err) = self.dispatch(unit, Directive::parse(&raw)) {
            self.console.error(&err.to_string());
        }
        Ok(())
    }

    /// Handle commands until `q` or end of input.
    fn session<R: BufRead>(&self, input: &mut R) -> Result<(), FleetError> {
        while let Some(line) = read_line(input)? {
            for command in Command::parse_line(&line) {
                match command {
                    Command::New => {
                        self.create_worker()?;
                    }
                    Command::Status => {
                        self.status();
                    }
                    Command::Help => self.help(),
                    Command::Quit => return Ok(()),
                    Command::Select { unit, directive } => {
                        self.select(unit, directive, input)?;
                    }
                    Command::Unrecognized(raw) => self
                        .console
                        .error(&format!("Unrecognized common command \"{raw}\".")),
                }
            }
        }
        Ok(())
    }

    /// Main loop: read commands until `q` or end of input, then shut down.
    ///
    /// Units are shut down even when the session ends with an error.
    pub fn run<R: BufRead>(self, mut input: R) -> Result<ShutdownReport, FleetError> {
        self.console
            .info("Enter your commands below (print \"h\" to know more):");
        let outcome = self.session(&mut input);
        if let Err(err) = &outcome {
            warn!(error = %err, "operator session ended early");
        }
        let report = self.shutdown();
        outcome.map(|()| report)
    }
}

/// Next input line without its terminator; bytes that are not UTF-8 are
/// replaced so they surface as unrecognized input.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
