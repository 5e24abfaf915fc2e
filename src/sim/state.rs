//! Round state types shared with the outside world
//!
//! Phases, terminal events, the seeded RNG wrapper and the per-tick snapshot
//! handed to render/audio collaborators.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{LossCause, Outcome};
use super::grid::{Cell, Direction};

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ticks are advancing the simulation
    #[default]
    Running,
    /// Head reached the outlet (terminal)
    Won,
    /// Collision ended the round (terminal)
    Lost,
}

impl GamePhase {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GamePhase::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Running => "Running",
            GamePhase::Won => "Won",
            GamePhase::Lost => "Lost",
        }
    }
}

/// One-shot signal emitted on the tick a round ends (win/lose cues)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Won,
    Lost { cause: LossCause },
}

impl GameEvent {
    /// Event for a terminal outcome, `None` for `Continue`
    pub fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Continue => None,
            Outcome::Won => Some(GameEvent::Won),
            Outcome::Lost(cause) => Some(GameEvent::Lost { cause }),
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Obstacle as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub position: Cell,
    pub velocity: Direction,
    pub group: u32,
}

/// Immutable view of a round after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks simulated so far
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    /// Head first
    pub cable: Vec<Cell>,
    /// Distinct obstacle cells, row-major
    pub occupied: Vec<Cell>,
    pub obstacles: Vec<ObstacleView>,
    pub outlet: Cell,
    pub phase: GamePhase,
    pub loss_cause: Option<LossCause>,
}

impl Snapshot {
    /// Plain-text frame: `@` head, `=` cable, `#` obstacle, `O` outlet
    pub fn render_text(&self) -> String {
        let mut rows = vec![vec!['.'; self.width.max(0) as usize]; self.height.max(0) as usize];
        let mut put = |cell: Cell, glyph: char| {
            if cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height {
                rows[cell.y as usize][cell.x as usize] = glyph;
            }
        };

        put(self.outlet, 'O');
        for &cell in &self.occupied {
            put(cell, '#');
        }
        for &cell in self.cable.iter().skip(1) {
            put(cell, '=');
        }
        if let Some(&head) = self.cable.first() {
            put(head, '@');
        }

        let mut out = String::with_capacity(rows.len() * (self.width.max(0) as usize + 1));
        for row in rows {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}
