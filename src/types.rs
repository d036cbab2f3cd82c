//! Shared identifiers, positions, and directives used across the fleet.

use std::fmt;

/// Stable identifier for a unit; never reused once assigned.
pub type WorkerId = usize;

/// Operator-facing unit number (1-based).
pub fn unit_number(id: WorkerId) -> usize {
    id + 1
}

/// Grid coordinate of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Next position one unit step in `direction`, or `None` if it leaves
    /// `[0, max_x] x [0, max_y]`.
    pub fn step(self, direction: Direction, max_x: i32, max_y: i32) -> Option<Position> {
        let (dx, dy) = direction.delta();
        let next = Position::new(self.x + dx, self.y + dy);
        if next.x < 0 || next.x > max_x || next.y < 0 || next.y > max_y {
            None
        } else {
            Some(next)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{};{}]", self.x, self.y)
    }
}

/// One unit's single-step move, as seen by the visualizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionEvent {
    pub worker: WorkerId,
    pub previous: Position,
    pub current: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Instruction targeted at a single unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Move { direction: Direction, steps: u32 },
    QueryPosition,
    Kill,
    Unrecognized(String),
}

impl Directive {
    /// Parse a directive line such as `r 3`, `p` or `k`.
    ///
    /// A missing or non-numeric step count means zero steps.
    pub fn parse(line: &str) -> Directive {
        let trimmed = line.trim();
        let mut tokens = trimmed.split_whitespace();
        let head = tokens.next().unwrap_or("");
        let direction = match head {
            "u" => Direction::Up,
            "d" => Direction::Down,
            "l" => Direction::Left,
            "r" => Direction::Right,
            "p" => return Directive::QueryPosition,
            "k" => return Directive::Kill,
            _ => return Directive::Unrecognized(trimmed.to_string()),
        };
        let steps = tokens
            .next()
            .and_then(|count| count.parse::<u32>().ok())
            .unwrap_or(0);
        Directive::Move { direction, steps }
    }
}
