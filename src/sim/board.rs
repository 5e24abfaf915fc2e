//! Board geometry and the outlet cell

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, manhattan};
use crate::error::ConfigError;

/// Smallest playable board edge
pub const MIN_BOARD_SIZE: i32 = 2;

/// Largest board edge
pub const MAX_BOARD_SIZE: i32 = 1024;

/// Fixed grid geometry plus the target outlet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: i32,
    height: i32,
    outlet: Cell,
}

impl Board {
    /// Build a board with a pinned outlet
    pub fn new(width: i32, height: i32, outlet: Cell) -> Result<Self, ConfigError> {
        check_size(width, height)?;
        let board = Self {
            width,
            height,
            outlet,
        };
        if !board.is_inside(outlet) {
            return Err(ConfigError::InvalidOutlet {
                x: outlet.x,
                y: outlet.y,
            });
        }
        Ok(board)
    }

    /// Build a board and draw the outlet uniformly from the cells that are
    /// off the cable and at least `min_distance` (inclusive) away from its head.
    /// The Python prototype required a strictly greater distance than half
    /// the width; `Settings::outlet_distance` rounds that down and compares
    /// inclusively instead.
    ///
    /// Falls back to any free cell when nothing is far enough.
    pub fn generate(
        width: i32,
        height: i32,
        cable: &[Cell],
        min_distance: i32,
        rng: &mut impl Rng,
    ) -> Result<Self, ConfigError> {
        check_size(width, height)?;
        let head = cable.first().copied().unwrap_or(IVec2::ZERO);

        let free: Vec<Cell> = (0..height)
            .flat_map(|y| (0..width).map(move |x| IVec2::new(x, y)))
            .filter(|cell| !cable.contains(cell))
            .collect();
        let far: Vec<Cell> = free
            .iter()
            .copied()
            .filter(|&cell| manhattan(cell, head) >= min_distance)
            .collect();

        let pool = if far.is_empty() {
            log::debug!("no outlet cell at distance >= {min_distance}, using any free cell");
            &free
        } else {
            &far
        };
        let outlet = *pool.choose(rng).ok_or(ConfigError::NoRoomForOutlet)?;

        Ok(Self {
            width,
            height,
            outlet,
        })
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn outlet(&self) -> Cell {
        self.outlet
    }

    /// Total number of cells
    pub fn area(&self) -> usize {
        area(self.width, self.height)
    }

    #[inline]
    pub fn is_inside(&self, cell: Cell) -> bool {
        in_bounds(self.width, self.height, cell)
    }

    #[inline]
    pub fn is_outlet(&self, cell: Cell) -> bool {
        cell == self.outlet
    }

    /// Toroidal image of a cell
    #[inline]
    pub fn wrap(&self, cell: Cell) -> Cell {
        IVec2::new(cell.x.rem_euclid(self.width), cell.y.rem_euclid(self.height))
    }

    /// Every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| IVec2::new(x, y)))
    }
}

/// Reject boards outside `MIN_BOARD_SIZE..=MAX_BOARD_SIZE` on either edge
pub fn check_size(width: i32, height: i32) -> Result<(), ConfigError> {
    if width < MIN_BOARD_SIZE || height < MIN_BOARD_SIZE {
        return Err(ConfigError::BoardTooSmall { width, height });
    }
    if width > MAX_BOARD_SIZE || height > MAX_BOARD_SIZE {
        return Err(ConfigError::BoardTooLarge {
            width,
            height,
            max: MAX_BOARD_SIZE,
        });
    }
    Ok(())
}

/// True if `cell` lies on a `width` x `height` grid
#[inline]
pub fn in_bounds(width: i32, height: i32, cell: Cell) -> bool {
    cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height
}

/// Cell count of a `width` x `height` grid; negative edges count as empty
pub fn area(width: i32, height: i32) -> usize {
    width.max(0) as usize * height.max(0) as usize
}
