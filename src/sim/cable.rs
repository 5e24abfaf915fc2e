//! The player's cable: an ordered body that advances one cell per tick

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::board::{Board, MAX_BOARD_SIZE, in_bounds};
use super::grid::{Cell, Direction};
use crate::error::ConfigError;

/// Longest starting cable; a straight run along the largest board edge
pub const MAX_CABLE_LENGTH: usize = MAX_BOARD_SIZE as usize;

/// Whether the cable keeps its tail when it advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrowthPolicy {
    /// Grow by one segment on every tick (the cable is being laid out)
    #[default]
    EveryTick,
    /// Keep the starting length; the tail follows the head
    Fixed,
}

/// The player-controlled body. `segments[0]` is the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    segments: VecDeque<Cell>,
    direction: Direction,
    growth: GrowthPolicy,
}

impl Cable {
    /// Lay out `length` segments starting at `head`, trailing behind it
    /// (opposite to `direction`).
    pub fn new(
        head: Cell,
        length: usize,
        direction: Direction,
        growth: GrowthPolicy,
    ) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::EmptyCable);
        }
        if length > MAX_CABLE_LENGTH {
            return Err(ConfigError::CableTooLong {
                length,
                max: MAX_CABLE_LENGTH,
            });
        }
        let back = direction.opposite().offset();
        let segments = (0..length as i32).map(|i| head + back * i).collect();
        Ok(Self {
            segments,
            direction,
            growth,
        })
    }

    /// True if every segment lies on the board
    pub fn fits(&self, board: &Board) -> bool {
        self.fits_within(board.width(), board.height())
    }

    /// True if every segment lies on a `width` x `height` grid
    pub fn fits_within(&self, width: i32, height: i32) -> bool {
        self.segments.iter().all(|&cell| in_bounds(width, height, cell))
    }

    #[inline]
    pub fn head(&self) -> Cell {
        // Constructor guarantees at least one segment and advance never shrinks below it
        self.segments[0]
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments from head to tail
    pub fn segments(&self) -> impl Iterator<Item = Cell> + '_ {
        self.segments.iter().copied()
    }

    /// Segments behind the head
    pub fn body(&self) -> impl Iterator<Item = Cell> + '_ {
        self.segments.iter().skip(1).copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.segments.contains(&cell)
    }

    /// Request a new heading. Reversals are ignored; returns whether the
    /// request was taken.
    pub fn set_direction(&mut self, requested: Direction) -> bool {
        if requested.is_opposite(self.direction) {
            return false;
        }
        self.direction = requested;
        true
    }

    /// Move the head one cell along the current heading.
    ///
    /// No bounds or collision checks happen here; see `collision::resolve`.
    pub fn advance(&mut self) {
        let new_head = self.head() + self.direction.offset();
        self.segments.push_front(new_head);
        if self.growth == GrowthPolicy::Fixed {
            self.segments.pop_back();
        }
    }
}
