//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick only
//! - Seeded RNG only
//! - Stable iteration order (generation order, group order)
//! - No rendering, audio or platform dependencies

pub mod autopilot;
pub mod board;
pub mod cable;
pub mod collision;
pub mod grid;
pub mod obstacles;
pub mod state;
pub mod tick;

pub use board::Board;
pub use cable::{Cable, GrowthPolicy};
pub use collision::{LossCause, Outcome, resolve};
pub use grid::{Cell, Direction, manhattan};
pub use obstacles::{BoundaryPolicy, GenerationTuning, Obstacle, ObstacleField};
pub use state::{GameEvent, GamePhase, ObstacleView, RngState, Snapshot};
pub use tick::{GameLoop, InputBuffer};
