//! Fixed-tick game loop
//!
//! `GameLoop` owns the whole round and is the only thing that mutates it.
//! One call to `tick` runs the fixed sequence:
//! input -> cable move -> obstacle move -> collision check -> phase update.

use rand_pcg::Pcg32;

use super::board::Board;
use super::cable::Cable;
use super::collision::{LossCause, Outcome, resolve};
use super::grid::{Cell, Direction};
use super::obstacles::ObstacleField;
use super::state::{GameEvent, GamePhase, ObstacleView, RngState, Snapshot};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Single-slot direction buffer between the input collaborator and the loop.
/// The last write wins; the loop drains it once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputBuffer {
    pending: Option<Direction>,
}

impl InputBuffer {
    pub fn push(&mut self, direction: Direction) {
        self.pending = Some(direction);
    }

    pub fn take(&mut self) -> Option<Direction> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<Direction> {
        self.pending
    }
}

/// One round of the game
#[derive(Debug, Clone)]
pub struct GameLoop {
    board: Board,
    cable: Cable,
    obstacles: ObstacleField,
    rng_state: RngState,
    rng: Pcg32,
    input: InputBuffer,
    phase: GamePhase,
    loss_cause: Option<LossCause>,
    /// Simulation tick counter
    time_ticks: u64,
}

impl GameLoop {
    /// Build a round from settings. The seed drives the outlet draw,
    /// obstacle generation and obstacle turns.
    pub fn new(settings: &Settings, seed: u64) -> Result<Self, ConfigError> {
        settings.validate()?;

        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();

        let cable = settings.initial_cable()?;
        let start: Vec<Cell> = cable.segments().collect();

        let board = match settings.outlet {
            Some(outlet) => Board::new(settings.width, settings.height, outlet)?,
            None => Board::generate(
                settings.width,
                settings.height,
                &start,
                settings.outlet_distance(),
                &mut rng,
            )?,
        };

        let obstacles = ObstacleField::generate(
            &board,
            &start,
            settings.num_obstacles,
            &settings.generation,
            settings.boundary,
            &mut rng,
        )?;

        log::info!(
            "New round: {}x{} board, seed {}, {} obstacles, outlet at ({}, {})",
            board.width(),
            board.height(),
            seed,
            obstacles.len(),
            board.outlet().x,
            board.outlet().y
        );

        Ok(Self {
            board,
            cable,
            obstacles,
            rng_state,
            rng,
            input: InputBuffer::default(),
            phase: GamePhase::Running,
            loss_cause: None,
            time_ticks: 0,
        })
    }

    /// Assemble a round from prebuilt pieces (fixed scenarios, replays).
    ///
    /// Obstacles are taken as given, even if they sit on the outlet.
    pub fn from_parts(
        board: Board,
        cable: Cable,
        obstacles: ObstacleField,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let head = cable.head();
        if !cable.fits(&board) {
            return Err(ConfigError::CableDoesNotFit {
                x: head.x,
                y: head.y,
                length: cable.len(),
                width: board.width(),
                height: board.height(),
            });
        }
        if cable.contains(board.outlet()) {
            return Err(ConfigError::InvalidOutlet {
                x: board.outlet().x,
                y: board.outlet().y,
            });
        }

        let rng_state = RngState::new(seed);
        Ok(Self {
            board,
            cable,
            obstacles,
            rng: rng_state.to_rng(),
            rng_state,
            input: InputBuffer::default(),
            phase: GamePhase::Running,
            loss_cause: None,
            time_ticks: 0,
        })
    }

    /// Buffer a direction request for the next tick.
    ///
    /// A request that reverses the current heading is dropped here, so the
    /// buffer always holds the most recent valid one. Returns whether it was kept.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.phase.is_terminal() || direction.is_opposite(self.cable.direction()) {
            return false;
        }
        self.input.push(direction);
        true
    }

    /// Advance the round by one step.
    ///
    /// Returns the terminal event on the tick the round ends and `None`
    /// otherwise. Once the round is over further calls do nothing.
    pub fn tick(&mut self) -> Option<GameEvent> {
        if self.phase.is_terminal() {
            return None;
        }
        self.time_ticks += 1;

        if let Some(direction) = self.input.take() {
            self.cable.set_direction(direction);
        }
        self.cable.advance();
        self.obstacles.advance(&self.board, &mut self.rng);

        let outcome = resolve(&self.board, &self.cable, &self.obstacles);
        log::trace!(
            "Tick {}: head ({}, {}) -> {:?}",
            self.time_ticks,
            self.cable.head().x,
            self.cable.head().y,
            outcome
        );

        match outcome {
            Outcome::Continue => {}
            Outcome::Won => {
                self.phase = GamePhase::Won;
                log::info!("Cable reached the outlet after {} ticks", self.time_ticks);
            }
            Outcome::Lost(cause) => {
                self.phase = GamePhase::Lost;
                self.loss_cause = Some(cause);
                log::info!("Round lost after {} ticks: cable {}", self.time_ticks, cause.as_str());
            }
        }
        GameEvent::from_outcome(outcome)
    }

    /// Immutable view for renderers
    pub fn snapshot(&self) -> Snapshot {
        let mut occupied: Vec<Cell> = self.obstacles.occupied_cells().into_iter().collect();
        occupied.sort_by_key(|cell| (cell.y, cell.x));

        Snapshot {
            tick: self.time_ticks,
            width: self.board.width(),
            height: self.board.height(),
            cable: self.cable.segments().collect(),
            occupied,
            obstacles: self
                .obstacles
                .obstacles()
                .iter()
                .map(|o| ObstacleView {
                    position: o.position,
                    velocity: o.velocity,
                    group: o.group,
                })
                .collect(),
            outlet: self.board.outlet(),
            phase: self.phase,
            loss_cause: self.loss_cause,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Set only when the phase is `Lost`
    pub fn loss_cause(&self) -> Option<LossCause> {
        self.loss_cause
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cable(&self) -> &Cable {
        &self.cable
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    /// Direction waiting for the next tick, if any
    pub fn pending_direction(&self) -> Option<Direction> {
        self.input.peek()
    }
}
