//! Cable Run - steer a growing cable through drifting obstacle fronts
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board, obstacles, cable, collisions, game loop)
//! - `settings`: Round parameters and presets, loadable from JSON
//! - `error`: Configuration and settings-file errors
//!
//! Rendering, input capture and sound are left to the embedding shell: it
//! feeds `GameLoop::steer`, calls `GameLoop::tick` at `Settings::tick_rate`
//! and draws `GameLoop::snapshot`.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SettingsError};
pub use settings::{Preset, Settings};
pub use sim::{GameEvent, GameLoop, GamePhase, Snapshot};

/// Game configuration constants
pub mod consts {
    /// Default board width in cells
    pub const DEFAULT_WIDTH: i32 = 40;
    /// Default board height in cells
    pub const DEFAULT_HEIGHT: i32 = 40;
    pub const DEFAULT_NUM_OBSTACLES: usize = 50;
    /// Ticks per second
    pub const DEFAULT_TICK_RATE: u32 = 5;
}
