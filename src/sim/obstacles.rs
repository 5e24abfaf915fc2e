//! Obstacle field: correlated generation and per-tick drift
//!
//! Obstacles are spawned in groups ("fronts"). Each group draws one seed cell
//! and one seed heading; the rest of the group is scattered around the seed
//! and mostly shares its heading. Groups also turn together while drifting,
//! so the field moves as a handful of coherent weather fronts instead of noise.

use std::collections::HashSet;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::grid::{Cell, Direction};
use crate::error::ConfigError;

/// Redraws per obstacle before falling back to a nearest-free-cell search
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 32;

/// Obstacles may occupy at most this fraction of the cells left free by the
/// cable and the outlet
pub const MAX_OBSTACLE_DENSITY: f32 = 0.5;

/// What happens when an obstacle drifts off the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Re-enter at the opposite edge
    #[default]
    Wrap,
    /// Bounce back, reversing the velocity
    Reflect,
}

/// Knobs for correlated generation and drift
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    /// Smallest group (inclusive)
    pub group_size_min: usize,
    /// Largest group (inclusive)
    pub group_size_max: usize,
    /// Max per-axis offset of a follower from its group seed
    pub jitter: i32,
    /// Probability a follower copies the seed heading (else a perpendicular one)
    pub cohesion: f32,
    /// Per-group, per-tick probability of a collective quarter turn
    pub turn_chance: f32,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            group_size_min: 3,
            group_size_max: 6,
            jitter: 2,
            cohesion: 0.8,
            turn_chance: 0.1,
        }
    }
}

impl GenerationTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_size_min == 0 {
            return Err(ConfigError::InvalidTuning("group_size_min must be at least 1"));
        }
        if self.group_size_max < self.group_size_min {
            return Err(ConfigError::InvalidTuning(
                "group_size_max must not be below group_size_min",
            ));
        }
        if self.jitter < 0 {
            return Err(ConfigError::InvalidTuning("jitter must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.cohesion) {
            return Err(ConfigError::InvalidTuning("cohesion must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.turn_chance) {
            return Err(ConfigError::InvalidTuning("turn_chance must be within 0..=1"));
        }
        Ok(())
    }
}

/// A single drifting obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Cell,
    pub velocity: Direction,
    /// Correlation group this obstacle was drawn with
    pub group: u32,
}

impl Obstacle {
    pub fn new(position: Cell, velocity: Direction, group: u32) -> Self {
        Self {
            position,
            velocity,
            group,
        }
    }

    /// Position and velocity after one step under `boundary`
    pub fn stepped(&self, board: &Board, boundary: BoundaryPolicy) -> (Cell, Direction) {
        let next = self.position + self.velocity.offset();
        match boundary {
            BoundaryPolicy::Wrap => (board.wrap(next), self.velocity),
            BoundaryPolicy::Reflect => {
                if board.is_inside(next) {
                    return (next, self.velocity);
                }
                let bounced = self.velocity.opposite();
                let back = self.position + bounced.offset();
                if board.is_inside(back) {
                    (back, bounced)
                } else {
                    // One cell thick along this axis
                    (self.position, bounced)
                }
            }
        }
    }
}

/// How many obstacles a board can hold once `reserved` cells (cable + outlet) are excluded
pub fn capacity(area: usize, reserved: usize) -> usize {
    let free = area.saturating_sub(reserved);
    (free as f32 * MAX_OBSTACLE_DENSITY).floor() as usize
}

/// The fixed population of obstacles for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    boundary: BoundaryPolicy,
    turn_chance: f32,
}

impl ObstacleField {
    /// A field with no obstacles
    pub fn empty(boundary: BoundaryPolicy) -> Self {
        Self::from_obstacles(Vec::new(), boundary, 0.0)
    }

    /// Wrap a hand-built obstacle set (scenarios, tests)
    pub fn from_obstacles(obstacles: Vec<Obstacle>, boundary: BoundaryPolicy, turn_chance: f32) -> Self {
        Self {
            obstacles,
            boundary,
            turn_chance: turn_chance.clamp(0.0, 1.0),
        }
    }

    /// Generate `count` obstacles in correlated groups.
    ///
    /// `reserved` cells (the cable's starting body) and the outlet are never
    /// used. Positions that collide are redrawn up to `MAX_PLACEMENT_ATTEMPTS`
    /// times, then the nearest free cell around the group seed is taken.
    pub fn generate(
        board: &Board,
        reserved: &[Cell],
        count: usize,
        tuning: &GenerationTuning,
        boundary: BoundaryPolicy,
        rng: &mut impl Rng,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let max = capacity(board.area(), reserved.len() + 1);
        if count > max {
            return Err(ConfigError::TooManyObstacles {
                requested: count,
                max,
            });
        }

        let mut placer = Placer {
            board,
            reserved,
            taken: HashSet::with_capacity(count),
        };
        let mut obstacles = Vec::with_capacity(count);
        let mut group = 0u32;

        while obstacles.len() < count {
            let size = rng
                .random_range(tuning.group_size_min..=tuning.group_size_max)
                .min(count - obstacles.len());
            let heading = Direction::ALL[rng.random_range(0..Direction::ALL.len())];

            // Seed obstacle: uniform draw, its accepted cell anchors the group
            let anchor = placer.place(rng, |rng| random_cell(board, rng), None)?;
            obstacles.push(Obstacle::new(anchor, heading, group));

            for _ in 1..size {
                let jitter = tuning.jitter;
                let position = placer.place(
                    rng,
                    |rng| {
                        anchor
                            + IVec2::new(
                                rng.random_range(-jitter..=jitter),
                                rng.random_range(-jitter..=jitter),
                            )
                    },
                    Some(anchor),
                )?;
                let velocity = if rng.random_bool(tuning.cohesion as f64) {
                    heading
                } else {
                    heading.perpendicular()[rng.random_range(0..2usize)]
                };
                obstacles.push(Obstacle::new(position, velocity, group));
            }
            group += 1;
        }

        log::info!(
            "Generated {} obstacles in {} groups ({:?} boundary)",
            obstacles.len(),
            group,
            boundary
        );

        Ok(Self {
            obstacles,
            boundary,
            turn_chance: tuning.turn_chance,
        })
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Cells currently covered by at least one obstacle
    pub fn occupied_cells(&self) -> HashSet<Cell> {
        self.obstacles.iter().map(|o| o.position).collect()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.obstacles.iter().any(|o| o.position == cell)
    }

    /// Cells obstacles would cover after a step with no group turn
    pub fn predicted_cells(&self, board: &Board) -> HashSet<Cell> {
        self.obstacles
            .iter()
            .map(|o| o.stepped(board, self.boundary).0)
            .collect()
    }

    /// Advance every obstacle by one cell.
    ///
    /// Groups may first turn together; then all obstacles step at once from
    /// their pre-tick positions.
    pub fn advance(&mut self, board: &Board, rng: &mut impl Rng) {
        if self.turn_chance > 0.0 {
            self.turn_groups(rng);
        }

        let boundary = self.boundary;
        for obstacle in &mut self.obstacles {
            let (position, velocity) = obstacle.stepped(board, boundary);
            obstacle.position = position;
            obstacle.velocity = velocity;
        }
    }

    fn turn_groups(&mut self, rng: &mut impl Rng) {
        let mut groups: Vec<u32> = self.obstacles.iter().map(|o| o.group).collect();
        groups.sort_unstable();
        groups.dedup();

        for group in groups {
            if !rng.random_bool(self.turn_chance as f64) {
                continue;
            }
            let clockwise = rng.random_bool(0.5);
            log::debug!("Obstacle group {group} turns {}", if clockwise { "cw" } else { "ccw" });
            for obstacle in self.obstacles.iter_mut().filter(|o| o.group == group) {
                obstacle.velocity = if clockwise {
                    obstacle.velocity.rotate_cw()
                } else {
                    obstacle.velocity.rotate_ccw()
                };
            }
        }
    }
}

/// Tracks which cells are already spoken for during generation
struct Placer<'a> {
    board: &'a Board,
    reserved: &'a [Cell],
    taken: HashSet<Cell>,
}

impl Placer<'_> {
    fn is_free(&self, cell: Cell) -> bool {
        self.board.is_inside(cell)
            && !self.board.is_outlet(cell)
            && !self.reserved.contains(&cell)
            && !self.taken.contains(&cell)
    }

    /// Draw with `draw` until a free cell comes up, then fall back to the
    /// nearest free cell around `around` (or the last rejected draw).
    fn place<R: Rng>(
        &mut self,
        rng: &mut R,
        mut draw: impl FnMut(&mut R) -> Cell,
        around: Option<Cell>,
    ) -> Result<Cell, ConfigError> {
        let mut last = around.unwrap_or(IVec2::ZERO);
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = draw(rng);
            if self.is_free(candidate) {
                self.taken.insert(candidate);
                return Ok(candidate);
            }
            last = candidate;
        }

        let origin = self.board.wrap(around.unwrap_or(last));
        let cell = self.nearest_free(origin).ok_or(ConfigError::TooManyObstacles {
            requested: self.taken.len() + 1,
            max: self.taken.len(),
        })?;
        log::debug!(
            "Placement retries exhausted near ({}, {}), using nearest free cell ({}, {})",
            origin.x,
            origin.y,
            cell.x,
            cell.y
        );
        self.taken.insert(cell);
        Ok(cell)
    }

    /// Scan Chebyshev rings of growing radius around `origin`, row-major within a ring
    fn nearest_free(&self, origin: Cell) -> Option<Cell> {
        let max_radius = self.board.width().max(self.board.height());
        for radius in 0..=max_radius {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let cell = origin + IVec2::new(dx, dy);
                    if self.is_free(cell) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }
}

fn random_cell(board: &Board, rng: &mut impl Rng) -> Cell {
    IVec2::new(
        rng.random_range(0..board.width()),
        rng.random_range(0..board.height()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn board_40() -> Board {
        Board::new(40, 40, IVec2::new(30, 5)).unwrap()
    }

    fn start_cells() -> Vec<Cell> {
        vec![IVec2::new(1, 38)]
    }

    fn generate(seed: u64, count: usize, tuning: &GenerationTuning) -> ObstacleField {
        let mut rng = Pcg32::seed_from_u64(seed);
        ObstacleField::generate(
            &board_40(),
            &start_cells(),
            count,
            tuning,
            BoundaryPolicy::Wrap,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_generation_respects_reserved_cells() {
        let board = board_40();
        for seed in 0..20 {
            let field = generate(seed, 50, &GenerationTuning::default());
            assert_eq!(field.len(), 50);

            let occupied = field.occupied_cells();
            assert_eq!(occupied.len(), 50, "obstacles must not stack at spawn");
            for cell in &occupied {
                assert!(board.is_inside(*cell));
                assert!(!board.is_outlet(*cell));
                assert!(!start_cells().contains(cell));
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(4242, 60, &GenerationTuning::default());
        let b = generate(4242, 60, &GenerationTuning::default());
        assert_eq!(a.obstacles(), b.obstacles());

        let c = generate(4243, 60, &GenerationTuning::default());
        assert_ne!(a.obstacles(), c.obstacles());
    }

    #[test]
    fn test_groups_are_bounded_and_ordered() {
        let tuning = GenerationTuning::default();
        let field = generate(9, 50, &tuning);

        let mut sizes = std::collections::BTreeMap::new();
        for obstacle in field.obstacles() {
            *sizes.entry(obstacle.group).or_insert(0usize) += 1;
        }
        // Every group but the last (which may be cut short) is within bounds
        let last = *sizes.keys().last().unwrap();
        for (group, size) in sizes {
            assert!(size <= tuning.group_size_max);
            if group != last {
                assert!(size >= tuning.group_size_min);
            }
        }
        assert!(field.obstacles().windows(2).all(|w| w[0].group <= w[1].group));
    }

    #[test]
    fn test_followers_cluster_around_seed() {
        let tuning = GenerationTuning::default();
        let field = generate(77, 20, &tuning);

        let mut anchor = None;
        for obstacle in field.obstacles() {
            match anchor {
                Some((group, cell)) if group == obstacle.group => {
                    let offset: IVec2 = obstacle.position - cell;
                    assert!(offset.abs().max_element() <= tuning.jitter);
                }
                _ => anchor = Some((obstacle.group, obstacle.position)),
            }
        }
    }

    #[test]
    fn test_full_cohesion_shares_heading() {
        let tuning = GenerationTuning {
            cohesion: 1.0,
            ..Default::default()
        };
        let field = generate(3, 40, &tuning);
        for pair in field.obstacles().windows(2) {
            if pair[0].group == pair[1].group {
                assert_eq!(pair[0].velocity, pair[1].velocity);
            }
        }
    }

    #[test]
    fn test_zero_cohesion_turns_followers_perpendicular() {
        let tuning = GenerationTuning {
            cohesion: 0.0,
            ..Default::default()
        };
        let field = generate(5, 40, &tuning);

        let mut seed_heading = None;
        for obstacle in field.obstacles() {
            match seed_heading {
                Some((group, heading)) if group == obstacle.group => {
                    assert!(Direction::perpendicular(heading).contains(&obstacle.velocity));
                }
                _ => seed_heading = Some((obstacle.group, obstacle.velocity)),
            }
        }
    }

    #[test]
    fn test_exhausted_retries_fall_back_to_nearest_free_cell() {
        // Zero jitter means every follower draw hits the seed cell itself
        let tuning = GenerationTuning {
            group_size_min: 3,
            group_size_max: 3,
            jitter: 0,
            ..Default::default()
        };
        let field = generate(11, 9, &tuning);
        assert_eq!(field.occupied_cells().len(), 9);

        for chunk in field.obstacles().chunks(3) {
            let anchor = chunk[0].position;
            for follower in &chunk[1..] {
                let offset: IVec2 = follower.position - anchor;
                assert_eq!(offset.abs().max_element(), 1);
            }
        }
    }

    #[test]
    fn test_too_many_obstacles() {
        let board = Board::new(4, 4, IVec2::new(3, 0)).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let reserved = [IVec2::new(0, 3)];
        // 16 cells - cable - outlet = 14 free, half of which is 7
        let result = ObstacleField::generate(
            &board,
            &reserved,
            8,
            &GenerationTuning::default(),
            BoundaryPolicy::Wrap,
            &mut rng,
        );
        assert_eq!(
            result,
            Err(ConfigError::TooManyObstacles { requested: 8, max: 7 })
        );

        let field = ObstacleField::generate(
            &board,
            &reserved,
            7,
            &GenerationTuning::default(),
            BoundaryPolicy::Wrap,
            &mut rng,
        )
        .unwrap();
        assert_eq!(field.occupied_cells().len(), 7);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let tuning = GenerationTuning {
            cohesion: 1.5,
            ..Default::default()
        };
        assert!(matches!(tuning.validate(), Err(ConfigError::InvalidTuning(_))));

        let tuning = GenerationTuning {
            group_size_min: 4,
            group_size_max: 2,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_wrap_at_edges() {
        let board = Board::new(5, 5, IVec2::new(2, 2)).unwrap();
        let mut field = ObstacleField::from_obstacles(
            vec![
                Obstacle::new(IVec2::new(4, 0), Direction::Right, 0),
                Obstacle::new(IVec2::new(1, 0), Direction::Up, 1),
                Obstacle::new(IVec2::new(2, 3), Direction::Down, 2),
            ],
            BoundaryPolicy::Wrap,
            0.0,
        );
        let mut rng = Pcg32::seed_from_u64(0);
        field.advance(&board, &mut rng);

        let positions: Vec<_> = field.obstacles().iter().map(|o| o.position).collect();
        assert_eq!(
            positions,
            vec![IVec2::new(0, 0), IVec2::new(1, 4), IVec2::new(2, 4)]
        );
        assert_eq!(field.obstacles()[0].velocity, Direction::Right);
    }

    #[test]
    fn test_reflect_at_edges() {
        let board = Board::new(5, 5, IVec2::new(2, 2)).unwrap();
        let mut field = ObstacleField::from_obstacles(
            vec![Obstacle::new(IVec2::new(4, 1), Direction::Right, 0)],
            BoundaryPolicy::Reflect,
            0.0,
        );
        let mut rng = Pcg32::seed_from_u64(0);
        field.advance(&board, &mut rng);
        assert_eq!(field.obstacles()[0].position, IVec2::new(3, 1));
        assert_eq!(field.obstacles()[0].velocity, Direction::Left);

        field.advance(&board, &mut rng);
        assert_eq!(field.obstacles()[0].position, IVec2::new(2, 1));
    }

    #[test]
    fn test_reflect_on_thin_board_stays_put() {
        let board = Board::new(5, 2, IVec2::new(0, 0)).unwrap();
        let obstacle = Obstacle::new(IVec2::new(3, 0), Direction::Up, 0);
        // Up is off the board, Down is inside
        assert_eq!(
            obstacle.stepped(&board, BoundaryPolicy::Reflect),
            (IVec2::new(3, 1), Direction::Down)
        );

        let board = Board::new(2, 2, IVec2::new(0, 0)).unwrap();
        let mut field = ObstacleField::from_obstacles(
            vec![Obstacle::new(IVec2::new(1, 1), Direction::Right, 0)],
            BoundaryPolicy::Reflect,
            0.0,
        );
        let mut rng = Pcg32::seed_from_u64(0);
        field.advance(&board, &mut rng);
        assert_eq!(field.obstacles()[0].position, IVec2::new(0, 1));
    }

    #[test]
    fn test_moves_are_simultaneous() {
        // Two obstacles in a line moving the same way never block each other
        let board = Board::new(6, 3, IVec2::new(0, 2)).unwrap();
        let mut field = ObstacleField::from_obstacles(
            vec![
                Obstacle::new(IVec2::new(1, 0), Direction::Right, 0),
                Obstacle::new(IVec2::new(2, 0), Direction::Right, 0),
            ],
            BoundaryPolicy::Wrap,
            0.0,
        );
        let mut rng = Pcg32::seed_from_u64(0);
        field.advance(&board, &mut rng);
        let occupied = field.occupied_cells();
        assert!(occupied.contains(&IVec2::new(2, 0)));
        assert!(occupied.contains(&IVec2::new(3, 0)));
    }

    #[test]
    fn test_group_turns_keep_fronts_coherent() {
        let board = board_40();
        let tuning = GenerationTuning {
            cohesion: 1.0,
            turn_chance: 1.0,
            ..Default::default()
        };
        let mut field = generate(21, 30, &tuning);
        let before: Vec<_> = field.obstacles().iter().map(|o| o.velocity).collect();

        let mut rng = Pcg32::seed_from_u64(99);
        field.advance(&board, &mut rng);

        for (obstacle, old) in field.obstacles().iter().zip(&before) {
            assert!(old.perpendicular().contains(&obstacle.velocity));
        }
        for pair in field.obstacles().windows(2) {
            if pair[0].group == pair[1].group {
                assert_eq!(pair[0].velocity, pair[1].velocity);
            }
        }
    }

    #[test]
    fn test_occupancy_queries() {
        let board = Board::new(5, 5, IVec2::new(4, 4)).unwrap();
        let field = ObstacleField::from_obstacles(
            vec![Obstacle::new(IVec2::new(2, 2), Direction::Left, 0)],
            BoundaryPolicy::Wrap,
            0.0,
        );
        assert!(field.is_occupied(IVec2::new(2, 2)));
        assert!(!field.is_occupied(IVec2::new(1, 2)));
        assert!(field.predicted_cells(&board).contains(&IVec2::new(1, 2)));
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    fn any_boundary() -> impl Strategy<Value = BoundaryPolicy> {
        prop_oneof![Just(BoundaryPolicy::Wrap), Just(BoundaryPolicy::Reflect)]
    }

    proptest! {
        #[test]
        fn prop_obstacles_stay_in_bounds(
            width in 2i32..12,
            height in 2i32..12,
            seeds in prop::collection::vec((0i32..12, 0i32..12, any_direction()), 1..20),
            boundary in any_boundary(),
            turn_chance in 0.0f32..=1.0,
            rng_seed in any::<u64>(),
            ticks in 1usize..40,
        ) {
            let board = Board::new(width, height, IVec2::ZERO).unwrap();
            let obstacles = seeds
                .iter()
                .enumerate()
                .map(|(i, &(x, y, dir))| {
                    Obstacle::new(IVec2::new(x % width, y % height), dir, i as u32 / 3)
                })
                .collect();
            let mut field = ObstacleField::from_obstacles(obstacles, boundary, turn_chance);
            let mut rng = Pcg32::seed_from_u64(rng_seed);

            for _ in 0..ticks {
                field.advance(&board, &mut rng);
                for obstacle in field.obstacles() {
                    prop_assert!(board.is_inside(obstacle.position));
                }
            }
            prop_assert_eq!(field.len(), seeds.len());
        }

        #[test]
        fn prop_generation_deterministic(seed in any::<u64>(), count in 0usize..80) {
            let a = generate(seed, count, &GenerationTuning::default());
            let b = generate(seed, count, &GenerationTuning::default());
            prop_assert_eq!(a.obstacles(), b.obstacles());
            prop_assert_eq!(a.occupied_cells().len(), count);
        }
    }
}
