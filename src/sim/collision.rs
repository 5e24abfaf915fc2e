//! Collision resolution for the post-move state
//!
//! Runs once per tick after both the cable and the obstacles have moved.
//! Checks are ordered: wall, self, obstacle, then outlet. A head that lands on
//! the outlet and an obstacle at the same time loses.

use serde::{Deserialize, Serialize};

use super::board::Board;
use super::cable::Cable;
use super::obstacles::ObstacleField;

/// Why a round was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// Head left the board
    WallCollision,
    /// Head ran into the cable's own body
    SelfCollision,
    /// Head shares a cell with an obstacle
    ObstacleCollision,
}

impl LossCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossCause::WallCollision => "hit the wall",
            LossCause::SelfCollision => "crossed its own cable",
            LossCause::ObstacleCollision => "hit an obstacle",
        }
    }
}

/// Result of judging one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Continue,
    Won,
    Lost(LossCause),
}

impl Outcome {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}

/// Judge the current head position. Pure: repeated calls on the same state agree.
pub fn resolve(board: &Board, cable: &Cable, obstacles: &ObstacleField) -> Outcome {
    let head = cable.head();

    if !board.is_inside(head) {
        return Outcome::Lost(LossCause::WallCollision);
    }
    if cable.body().any(|segment| segment == head) {
        return Outcome::Lost(LossCause::SelfCollision);
    }
    if obstacles.is_occupied(head) {
        return Outcome::Lost(LossCause::ObstacleCollision);
    }
    if board.is_outlet(head) {
        return Outcome::Won;
    }
    Outcome::Continue
}
