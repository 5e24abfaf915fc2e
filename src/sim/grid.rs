//! Grid primitives: cells and cardinal directions
//!
//! Screen convention: `x` grows to the right, `y` grows downward, so
//! `Direction::Up` is `(0, -1)`.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A board cell (column, row)
pub type Cell = IVec2;

/// One of the four cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in a fixed order (used for deterministic draws and tie-breaks)
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit step for this direction
    #[inline]
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    #[inline]
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Quarter turn clockwise (on screen, with y pointing down)
    pub fn rotate_cw(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn rotate_ccw(self) -> Self {
        self.rotate_cw().opposite()
    }

    /// The two directions at right angles to this one
    pub fn perpendicular(self) -> [Direction; 2] {
        [self.rotate_cw(), self.rotate_ccw()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" | "north" => Some(Direction::Up),
            "down" | "d" | "south" => Some(Direction::Down),
            "left" | "l" | "west" => Some(Direction::Left),
            "right" | "r" | "east" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Manhattan distance between two cells
#[inline]
pub fn manhattan(a: Cell, b: Cell) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}
