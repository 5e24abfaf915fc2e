//! Error types
//!
//! In-round collisions are not errors; they end the round through
//! `GamePhase::Lost`. Only unplayable configurations are reported here.

use thiserror::Error;

/// Raised once at construction when the requested parameters cannot produce a playable round
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be at least 2x2, got {width}x{height}")]
    BoardTooSmall { width: i32, height: i32 },

    #[error("board edges must be at most {max}, got {width}x{height}")]
    BoardTooLarge { width: i32, height: i32, max: i32 },

    #[error("cable of length {length} starting at ({x}, {y}) does not fit on a {width}x{height} board")]
    CableDoesNotFit {
        x: i32,
        y: i32,
        length: usize,
        width: i32,
        height: i32,
    },

    #[error("cable length must be at least 1")]
    EmptyCable,

    #[error("cable length {length} exceeds the maximum of {max}")]
    CableTooLong { length: usize, max: usize },

    #[error("outlet ({x}, {y}) must be inside the board and off the cable")]
    InvalidOutlet { x: i32, y: i32 },

    #[error("no free cell left for the outlet")]
    NoRoomForOutlet,

    #[error("{requested} obstacles requested but at most {max} fit on this board")]
    TooManyObstacles { requested: usize, max: usize },

    #[error("invalid tuning: {0}")]
    InvalidTuning(&'static str),
}

/// Failures loading or saving a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
