//! Occupancy grid fed by the shared position channel and redrawn per event.

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::logging::Console;
use crate::types::{Position, PositionEvent, WorkerId, unit_number};

/// Cells of the field; each holds at most one unit.
pub struct OccupancyGrid {
    max_x: i32,
    max_y: i32,
    cells: Vec<Option<WorkerId>>,
    label_width: usize,
}

impl OccupancyGrid {
    pub fn new(max_x: i32, max_y: i32) -> Self {
        let columns = (max_x + 1) as usize;
        let rows = (max_y + 1) as usize;
        Self {
            max_x,
            max_y,
            cells: vec![None; columns * rows],
            label_width: 1,
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.x > self.max_x || position.y < 0 || position.y > self.max_y
        {
            return None;
        }
        Some(position.y as usize * (self.max_x + 1) as usize + position.x as usize)
    }

    pub fn occupant(&self, position: Position) -> Option<WorkerId> {
        self.index(position).and_then(|index| self.cells[index])
    }

    /// Apply one move. The vacated cell is cleared only if it still shows this
    /// unit; the destination always takes the unit (last writer wins).
    pub fn apply(&mut self, event: &PositionEvent) {
        let (Some(previous), Some(current)) =
            (self.index(event.previous), self.index(event.current))
        else {
            warn!(?event, "position event outside the field ignored");
            return;
        };
        if self.cells[previous] == Some(event.worker) {
            self.cells[previous] = None;
        }
        self.cells[current] = Some(event.worker);
        let width = unit_number(event.worker).to_string().len();
        self.label_width = self.label_width.max(width);
    }

    /// Text frame: top row is `y = max_y`, followed by a `=` separator.
    pub fn render(&self) -> String {
        let columns = (self.max_x + 1) as usize;
        let width = self.label_width;
        let mut frame = String::with_capacity((columns * width + 2) * (self.max_y as usize + 2));
        for y in (0..=self.max_y).rev() {
            for x in 0..=self.max_x {
                match self.occupant(Position::new(x, y)) {
                    Some(id) => {
                        let _ = write!(frame, "{:>width$}", unit_number(id));
                    }
                    None => frame.push_str(&" ".repeat(width)),
                }
            }
            frame.push_str("|\n");
        }
        frame.push_str(&"=".repeat(columns * width + 1));
        frame.push('\n');
        frame
    }

    fn rows(&self) -> usize {
        (self.max_y + 1) as usize
    }
}

/// Whether stdout is an interactive terminal that understands ANSI control codes.
#[cfg(unix)]
pub fn stdout_is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 }
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
pub fn stdout_is_terminal() -> bool {
    false
}

struct Visualizer {
    grid: OccupancyGrid,
    console: Arc<dyn Console>,
    show_grid: bool,
    ansi: bool,
}

impl Visualizer {
    fn redraw(&self) {
        if !self.show_grid {
            return;
        }
        let mut frame = String::new();
        if self.ansi {
            // Clear the screen and home the cursor.
            frame.push_str("\x1b[2J\x1b[1;1H");
        }
        frame.push_str(&self.grid.render());
        if self.ansi {
            let _ = write!(frame, "\x1b[{};1H", self.grid.rows() + 2);
        }
        self.console.raw(&frame);
    }

    fn run(mut self, positions: Receiver<PositionEvent>) -> OccupancyGrid {
        for event in positions.iter() {
            debug!(?event, "applying position event");
            self.grid.apply(&event);
            self.redraw();
        }
        debug!("position channel closed");
        self.grid
    }
}

/// Start the visualizer; the thread ends once every position sender is gone
/// and hands back the final grid.
pub fn spawn(
    config: &FleetConfig,
    console: Arc<dyn Console>,
    ansi: bool,
    positions: Receiver<PositionEvent>,
) -> Result<JoinHandle<OccupancyGrid>, FleetError> {
    let visualizer = Visualizer {
        grid: OccupancyGrid::new(config.max_x, config.max_y),
        console,
        show_grid: config.show_grid,
        ansi,
    };
    thread::Builder::new()
        .name("visualizer".to_string())
        .spawn(move || visualizer.run(positions))
        .map_err(|source| FleetError::Spawn {
            role: "visualizer".to_string(),
            source,
        })
}
