#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Zone Capture engine.
//!
//! This crate defines the vocabulary that connects the arena, the pure
//! systems and the round controller: grid coordinates and cell states,
//! entity identifiers, the fill report produced by trail resolution, the
//! discrete events surfaced to embedding layers, and the configuration
//! types validated before a level may start. It owns no behavior beyond
//! construction, accessors and validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Points awarded per cell claimed during trail resolution.
pub const POINTS_PER_CELL: u32 = 10;
/// Points awarded for an enemy eliminated inside a claimed region.
pub const ENEMY_ELIMINATION_POINTS: u32 = 250;
/// Points awarded for a power-up destroyed inside a claimed region.
pub const POWERUP_FILL_POINTS: u32 = 250;
/// Points awarded when the player collects a power-up directly.
pub const POWERUP_COLLECT_POINTS: u32 = 100;

/// States a single arena tile can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Unclaimed open space the player may cross and enemies roam.
    Empty,
    /// Permanently captured territory, including the arena margin.
    Claimed,
    /// A cell of the player's uncommitted trail.
    Trail,
}

/// Location of a single arena cell expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new arena cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Unit vector of the direction in world coordinates.
    #[must_use]
    pub const fn unit(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

/// Movement axes available to axis-locked enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Movement along columns only.
    Horizontal,
    /// Movement along rows only.
    Vertical,
}

/// Unique identifier assigned to an enemy for the duration of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a power-up instance for a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PowerUpId(u32);

impl PowerUpId {
    /// Creates a new power-up identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Continuous velocity expressed in world units per second.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    dx: f32,
    dy: f32,
}

impl Velocity {
    /// A velocity with both components at rest.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new velocity from per-axis components.
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component in world units per second.
    #[must_use]
    pub const fn dx(&self) -> f32 {
        self.dx
    }

    /// Vertical component in world units per second.
    #[must_use]
    pub const fn dy(&self) -> f32 {
        self.dy
    }
}

/// Movement archetypes an enemy can be configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnemyBehavior {
    /// Diagonal movement reflecting off claimed territory.
    Bounce,
    /// Diagonal movement that additionally re-rolls its heading on a
    /// periodic timer, independent of collisions.
    #[serde(rename = "patrol-interval")]
    Patrol,
    /// Movement constrained to a single axis, flipping sign on collision.
    AxisLocked(Axis),
}

/// Power-up varieties recognized by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    /// Grants one additional life, up to the configured maximum.
    ExtraLife,
    /// Adds bonus seconds to the level clock.
    ExtraTime,
    /// Temporarily multiplies the player's movement speed.
    ExtraSpeed,
    /// Temporarily halts every enemy in place.
    Freeze,
}

/// Resting phases of a power-up instance's lifecycle.
///
/// Consumption is a transition, not a resting phase: a consumed instance
/// re-enters [`PowerUpPhase::Dormant`] with a fresh respawn delay within
/// the same operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpPhase {
    /// Off the board, waiting for its arm timestamp.
    Dormant,
    /// Visible and collectible.
    Armed,
    /// Visible, collectible, and about to despawn.
    Blinking,
}

/// Outcome of a request to mark a cell as part of the trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkTrail {
    /// The cell was empty and now carries the trail.
    Marked,
    /// The cell was already claimed or already part of the trail.
    Rejected,
}

/// A connected group of cells claimed during a single trail resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimedRegion {
    /// Cells of the region, in flood-fill discovery order.
    pub cells: Vec<CellCoord>,
}

impl ClaimedRegion {
    /// Number of cells the region spans.
    #[must_use]
    pub fn size_in_cells(&self) -> usize {
        self.cells.len()
    }
}

/// Result of resolving the player's trail against the arena.
#[derive(Clone, Debug, PartialEq)]
pub struct FillReport {
    /// Regions claimed by the resolution, excluding the surviving void.
    pub regions: Vec<ClaimedRegion>,
    /// Share of the interior claimed after the resolution, in percent.
    pub filled_percent: f32,
}

impl FillReport {
    /// Reports whether the resolution claimed any cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total number of cells claimed across all regions.
    #[must_use]
    pub fn claimed_cells(&self) -> usize {
        self.regions.iter().map(ClaimedRegion::size_in_cells).sum()
    }
}

/// Discrete occurrences the embedding layer reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A region of open space was claimed by trail resolution.
    RegionClaimed {
        /// Cells the region spans.
        cells: Vec<CellCoord>,
        /// Points awarded for the region.
        points: u32,
    },
    /// An enemy was caught inside a claimed region and removed from play.
    EnemyEliminated {
        /// Identifier of the removed enemy.
        id: EnemyId,
        /// World position the enemy held when eliminated.
        position: Position,
        /// Points awarded for the elimination.
        points: u32,
    },
    /// A power-up instance was consumed.
    PowerUpCollected {
        /// Identifier of the consumed instance.
        id: PowerUpId,
        /// Variety of the consumed instance.
        kind: PowerUpKind,
        /// World position the instance held when consumed.
        position: Position,
        /// Points awarded for the consumption.
        points: u32,
        /// Whether the instance was destroyed by a fill rather than
        /// collected by the player. Fill destruction awards points only.
        by_fill: bool,
    },
    /// The player lost a life.
    LifeLost,
    /// The level's finish threshold was crossed.
    LevelComplete {
        /// Bonus points awarded for the completion.
        bonus: u32,
    },
    /// The session ended with no lives remaining.
    GameOver {
        /// Final session score.
        score: u32,
        /// Total simulated time across the session.
        total_elapsed: Duration,
    },
}

/// Player input applied at the start of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerIntent {
    /// Requested facing direction, if any.
    pub direction: Option<Direction>,
    /// Pointer position in world units, if any. Converted to a cardinal
    /// direction by the dominant axis of the vector from the player.
    pub pointer: Option<Position>,
}

impl PlayerIntent {
    /// An intent carrying no input.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            direction: None,
            pointer: None,
        }
    }

    /// An intent requesting the provided facing direction.
    #[must_use]
    pub const fn toward(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            pointer: None,
        }
    }

    /// An intent steering toward the provided pointer position.
    #[must_use]
    pub const fn pointer_at(position: Position) -> Self {
        Self {
            direction: None,
            pointer: Some(position),
        }
    }
}

/// Top-level phases of the round state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundPhase {
    /// Normal simulation.
    Playing,
    /// Brief pause after a life loss, before the player regains control.
    LosingLife,
    /// The finish threshold was crossed; the next level loads shortly.
    LevelComplete,
    /// No lives remain. Terminal until the session is restarted.
    GameOver,
}

/// Per-tick summary returned to the embedding layer for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundSnapshot {
    /// Current session score.
    pub score: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Seconds left on the level clock.
    pub time_remaining: f32,
    /// Total simulated seconds across the session.
    pub total_elapsed: f32,
    /// Share of the interior claimed, in percent.
    pub filled_percent: f32,
    /// Zero-based index of the active level.
    pub level_index: usize,
    /// Phase of the round state machine.
    pub phase: RoundPhase,
}

/// Number of enemies sharing one behavior and speed within a level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    behavior: EnemyBehavior,
    speed: f32,
    count: u32,
}

impl EnemySpawn {
    /// Creates a new enemy spawn entry.
    #[must_use]
    pub const fn new(behavior: EnemyBehavior, speed: f32, count: u32) -> Self {
        Self {
            behavior,
            speed,
            count,
        }
    }

    /// Movement archetype shared by the spawned enemies.
    #[must_use]
    pub const fn behavior(&self) -> EnemyBehavior {
        self.behavior
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Number of enemies to spawn.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// Number of power-up instances of one kind within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpSpawn {
    kind: PowerUpKind,
    count: u32,
}

impl PowerUpSpawn {
    /// Creates a new power-up spawn entry.
    #[must_use]
    pub const fn new(kind: PowerUpKind, count: u32) -> Self {
        Self { kind, count }
    }

    /// Variety of the spawned instances.
    #[must_use]
    pub const fn kind(&self) -> PowerUpKind {
        self.kind
    }

    /// Number of instances to create.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// Configuration of a single level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    enemies: Vec<EnemySpawn>,
    powerups: Vec<PowerUpSpawn>,
    time_limit: f32,
    finish_percent: f32,
}

impl LevelConfig {
    /// Creates a new level configuration.
    #[must_use]
    pub fn new(
        enemies: Vec<EnemySpawn>,
        powerups: Vec<PowerUpSpawn>,
        time_limit: f32,
        finish_percent: f32,
    ) -> Self {
        Self {
            enemies,
            powerups,
            time_limit,
            finish_percent,
        }
    }

    /// Enemy spawn entries for the level.
    #[must_use]
    pub fn enemies(&self) -> &[EnemySpawn] {
        &self.enemies
    }

    /// Power-up spawn entries for the level.
    #[must_use]
    pub fn powerups(&self) -> &[PowerUpSpawn] {
        &self.powerups
    }

    /// Level clock limit.
    #[must_use]
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f32(self.time_limit.max(0.0))
    }

    /// Interior share that completes the level, in percent.
    #[must_use]
    pub const fn finish_percent(&self) -> f32 {
        self.finish_percent
    }

    /// Total number of enemies the level spawns.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.enemies.iter().map(EnemySpawn::count).sum()
    }

    /// Total number of power-up instances the level creates.
    #[must_use]
    pub fn total_powerups(&self) -> u32 {
        self.powerups.iter().map(PowerUpSpawn::count).sum()
    }
}

/// Configuration of an entire session: arena geometry plus the level list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    columns: u32,
    rows: u32,
    margin: u32,
    tile_length: f32,
    player_speed: f32,
    session_seed: u64,
    levels: Vec<LevelConfig>,
}

impl EngineConfig {
    /// Creates a new engine configuration.
    #[must_use]
    pub fn new(
        columns: u32,
        rows: u32,
        margin: u32,
        tile_length: f32,
        player_speed: f32,
        session_seed: u64,
        levels: Vec<LevelConfig>,
    ) -> Self {
        Self {
            columns,
            rows,
            margin,
            tile_length,
            player_speed,
            session_seed,
            levels,
        }
    }

    /// Number of tile columns in the arena, margin included.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the arena, margin included.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of the permanently claimed border ring, in tiles.
    #[must_use]
    pub const fn margin(&self) -> u32 {
        self.margin
    }

    /// Side length of a square tile in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Player movement speed in world units per second.
    #[must_use]
    pub const fn player_speed(&self) -> f32 {
        self.player_speed
    }

    /// Seed from which all per-level randomness is derived.
    #[must_use]
    pub const fn session_seed(&self) -> u64 {
        self.session_seed
    }

    /// Ordered list of level configurations.
    #[must_use]
    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }

    /// Validates the configuration, rejecting unplayable sessions.
    ///
    /// Every reported condition leaves the engine with no sensible
    /// behavior: an arena the margin swallows, a level no one can finish,
    /// or entities that cannot move.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.margin == 0 {
            return Err(ConfigError::MissingMargin);
        }
        if self.columns <= self.margin * 2 || self.rows <= self.margin * 2 {
            return Err(ConfigError::DegenerateArena {
                columns: self.columns,
                rows: self.rows,
                margin: self.margin,
            });
        }
        if !(self.tile_length > 0.0) {
            return Err(ConfigError::NonPositiveTileLength {
                value: self.tile_length,
            });
        }
        if !(self.player_speed > 0.0) {
            return Err(ConfigError::NonPositiveSpeed {
                value: self.player_speed,
            });
        }
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for (index, level) in self.levels.iter().enumerate() {
            if !(level.finish_percent > 0.0) || level.finish_percent > 100.0 {
                return Err(ConfigError::InvalidFinishThreshold {
                    level: index,
                    value: level.finish_percent,
                });
            }
            if !(level.time_limit > 0.0) {
                return Err(ConfigError::NonPositiveTimeLimit {
                    level: index,
                    value: level.time_limit,
                });
            }
            if level.total_enemies() == 0 {
                return Err(ConfigError::NoEnemies { level: index });
            }
            if level.total_powerups() == 0 {
                return Err(ConfigError::NoPowerUps { level: index });
            }
            for spawn in level.enemies() {
                if !(spawn.speed() > 0.0) {
                    return Err(ConfigError::NonPositiveSpeed {
                        value: spawn.speed(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Reasons a session configuration is rejected before simulation starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The arena has no permanently claimed border ring.
    #[error("arena margin must be at least one tile")]
    MissingMargin,
    /// The margin leaves no open interior to play in.
    #[error("margin of {margin} leaves no interior in a {columns}x{rows} arena")]
    DegenerateArena {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
        /// Configured margin width.
        margin: u32,
    },
    /// Tiles must have positive side length.
    #[error("tile length must be positive, got {value}")]
    NonPositiveTileLength {
        /// Rejected tile length.
        value: f32,
    },
    /// Movement speeds must be positive.
    #[error("movement speed must be positive, got {value}")]
    NonPositiveSpeed {
        /// Rejected speed.
        value: f32,
    },
    /// A session needs at least one level.
    #[error("session configures no levels")]
    NoLevels,
    /// A level clock must start above zero.
    #[error("level {level} has non-positive time limit {value}")]
    NonPositiveTimeLimit {
        /// Zero-based level index.
        level: usize,
        /// Rejected time limit in seconds.
        value: f32,
    },
    /// The finish threshold must lie in (0, 100].
    #[error("level {level} has finish threshold {value}, expected within (0, 100]")]
    InvalidFinishThreshold {
        /// Zero-based level index.
        level: usize,
        /// Rejected threshold in percent.
        value: f32,
    },
    /// A level must field at least one enemy.
    #[error("level {level} configures zero enemies")]
    NoEnemies {
        /// Zero-based level index.
        level: usize,
    },
    /// A level must field at least one power-up instance.
    #[error("level {level} configures zero power-ups")]
    NoPowerUps {
        /// Zero-based level index.
        level: usize,
    },
}
