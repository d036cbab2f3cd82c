//! A single simulated unit running on its own thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::logging::Console;
use crate::types::{Direction, Directive, Position, PositionEvent, WorkerId, unit_number};

/// Shared outbound channels handed to every unit.
#[derive(Clone)]
pub struct UnitLinks {
    pub positions: Sender<PositionEvent>,
    pub exits: Sender<WorkerId>,
    pub console: Arc<dyn Console>,
}

/// Sends the unit's id on the exit channel when dropped, so the reaper hears
/// about every exit: `Kill`, a closed command channel, or a panic.
struct ExitNotice {
    id: WorkerId,
    exits: Sender<WorkerId>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        debug!(unit = unit_number(self.id), "unit exiting");
        let _ = self.exits.send(self.id);
    }
}

struct Unit {
    id: WorkerId,
    position: Position,
    max_x: i32,
    max_y: i32,
    step_delay: Duration,
    positions: Sender<PositionEvent>,
    console: Arc<dyn Console>,
}

impl Unit {
    fn emit(&self, previous: Position) {
        let event = PositionEvent {
            worker: self.id,
            previous,
            current: self.position,
        };
        trace!(?event, "position event");
        // The visualizer may already be gone during shutdown.
        let _ = self.positions.send(event);
    }

    fn travel(&mut self, direction: Direction, steps: u32) {
        let n = unit_number(self.id);
        self.console
            .info(&format!("Unit {n} goes {}.", direction.name()));
        for _ in 0..steps {
            let Some(next) = self.position.step(direction, self.max_x, self.max_y) else {
                self.console.warning(&format!(
                    "Unit {n} reached the wall at {}",
                    self.position
                ));
                break;
            };
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }
            let previous = self.position;
            self.position = next;
            self.emit(previous);
        }
        self.console
            .info(&format!("Unit {n} stopped at {}", self.position));
    }

    fn run(mut self, inbound: Receiver<Directive>) {
        self.emit(Position::ORIGIN);
        while let Ok(directive) = inbound.recv() {
            debug!(unit = unit_number(self.id), ?directive, "directive received");
            match directive {
                Directive::Kill => break,
                Directive::QueryPosition => self.console.info(&format!(
                    "Unit {} position: {}",
                    unit_number(self.id),
                    self.position
                )),
                Directive::Move { direction, steps } => self.travel(direction, steps),
                Directive::Unrecognized(raw) => self
                    .console
                    .error(&format!("Unrecognized command \"{raw}\".")),
            }
        }
    }
}

/// Start unit `id` on a named thread; returns its command channel and handle.
pub fn spawn(
    id: WorkerId,
    links: &UnitLinks,
    config: &FleetConfig,
) -> Result<(Sender<Directive>, JoinHandle<()>), FleetError> {
    let (commands, inbound) = mpsc::channel();
    let unit = Unit {
        id,
        position: Position::ORIGIN,
        max_x: config.max_x,
        max_y: config.max_y,
        step_delay: config.step_delay,
        positions: links.positions.clone(),
        console: Arc::clone(&links.console),
    };
    let notice = ExitNotice {
        id,
        exits: links.exits.clone(),
    };
    let handle = thread::Builder::new()
        .name(format!("unit-{}", unit_number(id)))
        .spawn(move || {
            let _notice = notice;
            unit.run(inbound);
        })
        .map_err(|source| FleetError::Spawn {
            role: format!("unit {}", unit_number(id)),
            source,
        })?;
    debug!(unit = unit_number(id), "unit started");
    Ok((commands, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryConsole;

    struct Harness {
        console: Arc<MemoryConsole>,
        positions: Receiver<PositionEvent>,
        exits: Receiver<WorkerId>,
        links: UnitLinks,
        config: FleetConfig,
    }

    fn harness() -> Harness {
        let console = Arc::new(MemoryConsole::new());
        let (positions_tx, positions) = mpsc::channel();
        let (exits_tx, exits) = mpsc::channel();
        let links = UnitLinks {
            positions: positions_tx,
            exits: exits_tx,
            console: console.clone(),
        };
        let config = FleetConfig {
            max_x: 5,
            max_y: 5,
            step_delay: Duration::ZERO,
            ..FleetConfig::default()
        };
        Harness {
            console,
            positions,
            exits,
            links,
            config,
        }
    }

    fn recv_event(rx: &Receiver<PositionEvent>) -> PositionEvent {
        rx.recv_timeout(Duration::from_secs(1))
            .expect("position event")
    }

    #[test]
    fn registers_at_origin_then_walks_contiguously() {
        let h = harness();
        let (commands, handle) = spawn(0, &h.links, &h.config).expect("spawn");

        let first = recv_event(&h.positions);
        assert_eq!(first.previous, Position::ORIGIN);
        assert_eq!(first.current, Position::ORIGIN);

        commands
            .send(Directive::Move {
                direction: Direction::Right,
                steps: 3,
            })
            .expect("send move");
        let mut previous = Position::ORIGIN;
        for x in 1..=3 {
            let event = recv_event(&h.positions);
            assert_eq!(event.worker, 0);
            assert_eq!(event.previous, previous);
            assert_eq!(event.current, Position::new(x, 0));
            previous = event.current;
        }

        commands.send(Directive::QueryPosition).expect("send query");
        commands.send(Directive::Kill).expect("send kill");
        assert_eq!(h.exits.recv_timeout(Duration::from_secs(1)), Ok(0));
        handle.join().expect("unit thread panicked");

        assert!(h.console.contains("INFO: Unit 1 goes right."));
        assert!(h.console.contains("INFO: Unit 1 stopped at [3;0]"));
        assert!(h.console.contains("INFO: Unit 1 position: [3;0]"));
    }

    #[test]
    fn stops_at_the_wall_without_leaving_bounds() {
        let h = harness();
        let (commands, handle) = spawn(2, &h.links, &h.config).expect("spawn");
        recv_event(&h.positions);

        commands
            .send(Directive::Move {
                direction: Direction::Up,
                steps: 9,
            })
            .expect("send move");
        commands.send(Directive::Kill).expect("send kill");
        handle.join().expect("unit thread panicked");

        let events: Vec<PositionEvent> = h.positions.try_iter().collect();
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| e.current.y <= 5 && e.current.x == 0));
        assert_eq!(events.last().map(|e| e.current), Some(Position::new(0, 5)));
        assert!(h.console.contains("WARNING: Unit 3 reached the wall at [0;5]"));
        assert!(h.console.contains("INFO: Unit 3 stopped at [0;5]"));
    }

    #[test]
    fn unrecognized_directive_is_reported_and_ignored() {
        let h = harness();
        let (commands, handle) = spawn(0, &h.links, &h.config).expect("spawn");
        recv_event(&h.positions);

        commands
            .send(Directive::Unrecognized("x 3".to_string()))
            .expect("send");
        commands.send(Directive::QueryPosition).expect("send query");
        commands.send(Directive::Kill).expect("send kill");
        handle.join().expect("unit thread panicked");

        assert!(h.console.contains("ERROR: Unrecognized command \"x 3\"."));
        assert!(h.console.contains("INFO: Unit 1 position: [0;0]"));
        assert!(h.positions.try_recv().is_err());
    }

    #[test]
    fn nothing_is_read_after_kill() {
        let h = harness();
        let (commands, handle) = spawn(0, &h.links, &h.config).expect("spawn");
        recv_event(&h.positions);

        commands.send(Directive::Kill).expect("send kill");
        handle.join().expect("unit thread panicked");
        assert!(commands.send(Directive::QueryPosition).is_err());
        assert_eq!(h.exits.try_iter().collect::<Vec<_>>(), vec![0]);
        assert!(!h.console.contains("position"));
    }

    #[test]
    fn closed_command_channel_still_notifies_exit() {
        let h = harness();
        let (commands, handle) = spawn(4, &h.links, &h.config).expect("spawn");
        drop(commands);
        handle.join().expect("unit thread panicked");
        assert_eq!(h.exits.recv_timeout(Duration::from_secs(1)), Ok(4));
    }
}
