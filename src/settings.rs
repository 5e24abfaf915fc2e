//! Round settings
//!
//! Everything the engine needs before the first tick. Stored as JSON so the
//! runner can load a tuned board from disk.

use std::path::Path;
use std::time::Duration;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::{ConfigError, SettingsError};
use crate::sim::board;
use crate::sim::cable::{Cable, GrowthPolicy};
use crate::sim::grid::{Cell, Direction};
use crate::sim::obstacles::{BoundaryPolicy, GenerationTuning, capacity};

/// Starting-parameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    Calm,
    #[default]
    Standard,
    Storm,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Calm => "Calm",
            Preset::Standard => "Standard",
            Preset::Storm => "Storm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "calm" | "easy" => Some(Preset::Calm),
            "standard" | "std" | "normal" => Some(Preset::Standard),
            "storm" | "hard" => Some(Preset::Storm),
            _ => None,
        }
    }

    /// Obstacle population on the default 40x40 board
    pub fn num_obstacles(&self) -> usize {
        match self {
            Preset::Calm => 25,
            Preset::Standard => consts::DEFAULT_NUM_OBSTACLES,
            Preset::Storm => 90,
        }
    }

    /// Share of followers that copy their group's heading
    pub fn cohesion(&self) -> f32 {
        match self {
            Preset::Calm => 0.9,
            Preset::Standard => 0.8,
            Preset::Storm => 0.65,
        }
    }

    /// Per-group chance of a collective turn each tick
    pub fn turn_chance(&self) -> f32 {
        match self {
            Preset::Calm => 0.05,
            Preset::Standard => 0.1,
            Preset::Storm => 0.2,
        }
    }
}

/// Construction parameters for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: i32,
    pub height: i32,
    pub num_obstacles: usize,
    /// Simulation ticks per second (the external clock's rate)
    pub tick_rate: u32,

    // === Cable ===
    pub start_length: usize,
    /// Head start cell; defaults to one in from the bottom-left corner
    pub start: Option<Cell>,
    pub start_direction: Direction,
    pub growth: GrowthPolicy,

    // === Outlet ===
    /// Pin the outlet instead of drawing it
    pub outlet: Option<Cell>,
    /// Minimum Manhattan distance from the cable head to a drawn outlet
    pub min_outlet_distance: Option<i32>,

    // === Obstacles ===
    pub boundary: BoundaryPolicy,
    pub generation: GenerationTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: consts::DEFAULT_WIDTH,
            height: consts::DEFAULT_HEIGHT,
            num_obstacles: consts::DEFAULT_NUM_OBSTACLES,
            tick_rate: consts::DEFAULT_TICK_RATE,

            start_length: 1,
            start: None,
            start_direction: Direction::Right,
            growth: GrowthPolicy::EveryTick,

            outlet: None,
            min_outlet_distance: None,

            boundary: BoundaryPolicy::Wrap,
            generation: GenerationTuning::default(),
        }
    }
}

impl Settings {
    /// Create settings from a preset (applies preset defaults)
    pub fn from_preset(preset: Preset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a preset's obstacle parameters
    pub fn apply_preset(&mut self, preset: Preset) {
        self.num_obstacles = preset.num_obstacles();
        self.generation.cohesion = preset.cohesion();
        self.generation.turn_chance = preset.turn_chance();
    }

    /// Cable head start cell
    pub fn start_cell(&self) -> Cell {
        self.start.unwrap_or(IVec2::new(1, self.height.saturating_sub(2)))
    }

    /// Effective minimum outlet distance: half the longer edge, rounded down,
    /// compared inclusively by `Board::generate`
    pub fn outlet_distance(&self) -> i32 {
        self.min_outlet_distance
            .unwrap_or(self.width.max(self.height) / 2)
    }

    /// Wall-clock time between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    /// The cable this round starts with
    pub fn initial_cable(&self) -> Result<Cable, ConfigError> {
        let start = self.start_cell();
        let does_not_fit = ConfigError::CableDoesNotFit {
            x: start.x,
            y: start.y,
            length: self.start_length,
            width: self.width,
            height: self.height,
        };
        if !board::in_bounds(self.width, self.height, start) {
            return Err(does_not_fit);
        }
        let cable = Cable::new(start, self.start_length, self.start_direction, self.growth)?;
        if !cable.fits_within(self.width, self.height) {
            return Err(does_not_fit);
        }
        Ok(cable)
    }

    /// Check that these settings describe a playable round
    pub fn validate(&self) -> Result<(), ConfigError> {
        board::check_size(self.width, self.height)?;
        if self.tick_rate == 0 {
            return Err(ConfigError::InvalidTuning("tick_rate must be positive"));
        }
        self.generation.validate()?;

        let cable = self.initial_cable()?;
        let area = board::area(self.width, self.height);
        if area <= cable.len() {
            return Err(ConfigError::NoRoomForOutlet);
        }
        if let Some(outlet) = self.outlet {
            if !board::in_bounds(self.width, self.height, outlet) || cable.contains(outlet) {
                return Err(ConfigError::InvalidOutlet {
                    x: outlet.x,
                    y: outlet.y,
                });
            }
        }

        let max = capacity(area, cable.len() + 1);
        if self.num_obstacles > max {
            return Err(ConfigError::TooManyObstacles {
                requested: self.num_obstacles,
                max,
            });
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
