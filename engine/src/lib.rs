#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round controller for Zone Capture.
//!
//! The [`Engine`] owns the arena, the player, the enemies and the power-up
//! instances, and advances them through one fixed-order simulation step
//! per [`Engine::tick`] call: player intent, trail tracking (including at
//! most one trail resolution), enemy motion, power-up timers, the clocks,
//! and finally the round transitions. Discrete events flow into the
//! caller's event vector; rendering and input layers only ever see the
//! read-only snapshot surface.

use std::collections::HashSet;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use zone_capture_arena::{query, Grid};
use zone_capture_core::{
    CellCoord, CellState, ConfigError, Direction, EnemyId, EngineConfig, Event, FillReport,
    PlayerIntent, Position, PowerUpId, PowerUpKind, PowerUpPhase, RoundPhase, RoundSnapshot,
    Velocity, ENEMY_ELIMINATION_POINTS, POINTS_PER_CELL, POWERUP_COLLECT_POINTS,
    POWERUP_FILL_POINTS,
};
use zone_capture_system_motion::{Enemy, Motion, StepOutcome};
use zone_capture_system_powerups::{Lifecycle, PowerUpInstance};
use zone_capture_system_trail::{TrailStep, TrailTracker};

const STARTING_LIVES: u32 = 3;
const MAX_LIVES: u32 = 5;
const RESPAWN_DELAY: Duration = Duration::from_secs(1);
const LEVEL_ADVANCE_DELAY: Duration = Duration::from_secs(5);
const EXTRA_TIME_BONUS: Duration = Duration::from_secs(30);
const FREEZE_DURATION: Duration = Duration::from_secs(3);
const SPEED_BOOST_FACTOR: f32 = 1.3;
const SPEED_BOOST_DURATION: Duration = Duration::from_secs(5);
const COMPLETION_BASE_BONUS: u32 = 50;
const COMPLETION_SECOND_BONUS: u32 = 10;

/// Domain separator for per-level seed derivation.
const SEED_DOMAIN: &[u8] = b"zone-capture/level-seed/v1";

/// The authoritative simulation owning all round state.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    tracker: TrailTracker,
    motion: Motion,
    lifecycle: Lifecycle,
    player: Player,
    enemies: Vec<Enemy>,
    powerups: Vec<PowerUpInstance>,
    phase: Phase,
    lives: u32,
    score: u32,
    time_remaining: Duration,
    total_elapsed: Duration,
    level_index: usize,
    rng: ChaCha8Rng,
}

#[derive(Clone, Copy, Debug)]
enum Phase {
    Playing,
    LosingLife { resume_at: Duration },
    LevelComplete { advance_at: Duration },
    GameOver,
}

#[derive(Clone, Copy, Debug)]
struct Player {
    position: Position,
    facing: Option<Direction>,
    speed: f32,
    boost: Option<SpeedBoost>,
}

#[derive(Clone, Copy, Debug)]
struct SpeedBoost {
    until: Duration,
    base_speed: f32,
}

/// Read-only description of one enemy, for rendering layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Stable identifier to key visuals by.
    pub id: EnemyId,
    /// Current world position.
    pub position: Position,
    /// Current velocity.
    pub velocity: Velocity,
    /// Whether a freeze effect currently halts the enemy.
    pub frozen: bool,
}

/// Read-only description of one power-up instance, for rendering layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerUpSnapshot {
    /// Stable identifier to key visuals by.
    pub id: PowerUpId,
    /// Variety of the instance.
    pub kind: PowerUpKind,
    /// Lifecycle phase the instance currently rests in.
    pub phase: PowerUpPhase,
    /// World position of the instance while it is on the board.
    pub position: Option<Position>,
}

impl Engine {
    /// Builds an engine from the provided configuration and loads the
    /// first level.
    ///
    /// Rejects unplayable configurations with a descriptive error; see
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = Grid::new(
            config.columns(),
            config.rows(),
            config.margin(),
            config.tile_length(),
        );
        let spawn = spawn_point(&grid);
        let mut engine = Self {
            player: Player {
                position: spawn,
                facing: None,
                speed: config.player_speed(),
                boost: None,
            },
            grid,
            tracker: TrailTracker,
            motion: Motion,
            lifecycle: Lifecycle::default(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            phase: Phase::Playing,
            lives: STARTING_LIVES,
            score: 0,
            time_remaining: Duration::ZERO,
            total_elapsed: Duration::ZERO,
            level_index: 0,
            rng: ChaCha8Rng::seed_from_u64(config.session_seed()),
            config,
        };
        engine.load_level(0);
        Ok(engine)
    }

    /// Advances the simulation by one step.
    ///
    /// `intent` carries the player input gathered since the last tick;
    /// discrete events are pushed onto `out_events` in the order they
    /// occur. Returns the post-tick snapshot for the display layer.
    pub fn tick(
        &mut self,
        dt: Duration,
        intent: PlayerIntent,
        out_events: &mut Vec<Event>,
    ) -> RoundSnapshot {
        match self.phase {
            Phase::GameOver => return self.snapshot(),
            Phase::LevelComplete { advance_at } => {
                self.total_elapsed = self.total_elapsed.saturating_add(dt);
                if self.total_elapsed >= advance_at {
                    self.advance_level();
                }
                return self.snapshot();
            }
            Phase::Playing | Phase::LosingLife { .. } => {}
        }

        let now = self.total_elapsed;

        // (1) input, (2) trail. Both are skipped while the player is
        // waiting out a life loss; the rest of the board keeps living.
        if matches!(self.phase, Phase::Playing) {
            self.apply_intent(intent);
            self.expire_speed_boost(now);
            self.move_player(dt);

            match self.tracker.track(self.player.position, &mut self.grid) {
                TrailStep::Closed(report) => self.consume_fill_report(&report, now, out_events),
                TrailStep::Cut => self.lose_life(now, out_events),
                TrailStep::Extended(_) | TrailStep::Coasting => {}
            }
        }

        // (3) enemy motion, against the post-resolution grid.
        let motion = &self.motion;
        let mut trail_cut = false;
        for enemy in &mut self.enemies {
            let outcome = motion.advance(enemy, &self.grid, dt, now, &mut self.rng);
            if outcome == StepOutcome::TrailCut {
                trail_cut = true;
            }
        }
        if trail_cut {
            self.lose_life(now, out_events);
        }
        if matches!(self.phase, Phase::Playing) {
            let player_cell = query::cell_at(&self.grid, self.player.position);
            let overlap = player_cell.is_some()
                && self
                    .enemies
                    .iter()
                    .any(|enemy| query::cell_at(&self.grid, enemy.position()) == player_cell);
            if overlap {
                self.lose_life(now, out_events);
            }
        }

        // (4) power-up timers, then pickups. A power-up consumed by fill
        // earlier in this tick is dormant by now and cannot be collected
        // a second time.
        for instance in &mut self.powerups {
            let _ = self
                .lifecycle
                .advance(instance, &self.grid, now, &mut self.rng);
        }
        if matches!(self.phase, Phase::Playing) {
            self.collect_overlapping_powerups(now, out_events);
        }

        // (5) clocks.
        self.total_elapsed = self.total_elapsed.saturating_add(dt);
        self.time_remaining = self.time_remaining.saturating_sub(dt);
        if self.time_remaining.is_zero() && matches!(self.phase, Phase::Playing) {
            self.lose_life(self.total_elapsed, out_events);
            self.time_remaining = self.config.levels()[self.level_index].time_limit();
        }

        // (6) transitions.
        if let Phase::LosingLife { resume_at } = self.phase {
            if self.total_elapsed >= resume_at {
                self.phase = Phase::Playing;
            }
        }

        self.snapshot()
    }

    /// Resets the whole session: first level, starting lives, zero score.
    ///
    /// The only way out of [`RoundPhase::GameOver`].
    pub fn restart_session(&mut self) {
        self.lives = STARTING_LIVES;
        self.score = 0;
        self.total_elapsed = Duration::ZERO;
        self.load_level(0);
    }

    /// Post-tick summary for the display layer.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            score: self.score,
            lives: self.lives,
            time_remaining: self.time_remaining.as_secs_f32(),
            total_elapsed: self.total_elapsed.as_secs_f32(),
            filled_percent: query::filled_percent(&self.grid),
            level_index: self.level_index,
            phase: match self.phase {
                Phase::Playing => RoundPhase::Playing,
                Phase::LosingLife { .. } => RoundPhase::LosingLife,
                Phase::LevelComplete { .. } => RoundPhase::LevelComplete,
                Phase::GameOver => RoundPhase::GameOver,
            },
        }
    }

    /// Read-only access to the arena, for renderers and tests.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Dense row-major view of every cell state, consumed once per frame
    /// by the rendering collaborator.
    #[must_use]
    pub fn cell_states(&self) -> &[CellState] {
        query::cell_states(&self.grid)
    }

    /// Current player position in world units.
    #[must_use]
    pub fn player_position(&self) -> Position {
        self.player.position
    }

    /// Read-only view of every enemy, ordered by identifier.
    #[must_use]
    pub fn enemy_snapshots(&self) -> Vec<EnemySnapshot> {
        let mut snapshots: Vec<EnemySnapshot> = self
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id(),
                position: enemy.position(),
                velocity: enemy.velocity(),
                frozen: enemy.is_frozen(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Read-only view of every power-up instance, ordered by identifier.
    #[must_use]
    pub fn powerup_snapshots(&self) -> Vec<PowerUpSnapshot> {
        let mut snapshots: Vec<PowerUpSnapshot> = self
            .powerups
            .iter()
            .map(|instance| PowerUpSnapshot {
                id: instance.id(),
                kind: instance.kind(),
                phase: instance.phase(),
                position: instance
                    .cell()
                    .map(|cell| query::cell_center(&self.grid, cell)),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    fn load_level(&mut self, index: usize) {
        debug_assert!(index < self.config.levels().len());
        let level = self.config.levels()[index].clone();

        self.level_index = index;
        self.grid = Grid::new(
            self.config.columns(),
            self.config.rows(),
            self.config.margin(),
            self.config.tile_length(),
        );
        self.rng = ChaCha8Rng::seed_from_u64(derive_level_seed(
            self.config.session_seed(),
            index,
        ));
        self.time_remaining = level.time_limit();
        self.player.position = spawn_point(&self.grid);
        self.player.facing = None;
        self.player.speed = self.config.player_speed();
        self.player.boost = None;

        let now = self.total_elapsed;
        self.enemies.clear();
        let mut next_enemy = 0;
        for spawn in level.enemies() {
            for _ in 0..spawn.count() {
                let mut enemy = Enemy::new(EnemyId::new(next_enemy), spawn.behavior(), spawn.speed());
                next_enemy += 1;
                if let Some(cell) = random_open_cell(&self.grid, &mut self.rng) {
                    enemy.place(query::cell_center(&self.grid, cell));
                }
                enemy.roll_heading(&mut self.rng);
                enemy.schedule_redirect(now, &mut self.rng);
                self.enemies.push(enemy);
            }
        }

        self.powerups.clear();
        let mut next_powerup = 0;
        for spawn in level.powerups() {
            for _ in 0..spawn.count() {
                let mut instance = PowerUpInstance::new(PowerUpId::new(next_powerup), spawn.kind());
                next_powerup += 1;
                self.lifecycle
                    .schedule_spawn(&mut instance, now, &mut self.rng);
                self.powerups.push(instance);
            }
        }

        self.phase = Phase::Playing;
    }

    fn advance_level(&mut self) {
        let next = self.level_index + 1;
        if next < self.config.levels().len() {
            self.load_level(next);
        } else {
            self.restart_session();
        }
    }

    fn apply_intent(&mut self, intent: PlayerIntent) {
        if let Some(direction) = intent.direction {
            self.player.facing = Some(direction);
            return;
        }
        let Some(pointer) = intent.pointer else {
            return;
        };
        let dx = pointer.x() - self.player.position.x();
        let dy = pointer.y() - self.player.position.y();
        // Pointers within one tile of the player carry no direction.
        if dx.abs().max(dy.abs()) < query::tile_length(&self.grid) {
            return;
        }
        self.player.facing = Some(if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        });
    }

    fn expire_speed_boost(&mut self, now: Duration) {
        if let Some(boost) = self.player.boost {
            if now >= boost.until {
                self.player.speed = boost.base_speed;
                self.player.boost = None;
            }
        }
    }

    fn move_player(&mut self, dt: Duration) {
        let Some(facing) = self.player.facing else {
            return;
        };
        let (ux, uy) = facing.unit();
        let distance = self.player.speed * dt.as_secs_f32();
        let x = (self.player.position.x() + ux * distance).clamp(0.0, query::width(&self.grid) - 0.001);
        let y = (self.player.position.y() + uy * distance).clamp(0.0, query::height(&self.grid) - 0.001);
        self.player.position = Position::new(x, y);
    }

    fn consume_fill_report(&mut self, report: &FillReport, now: Duration, out_events: &mut Vec<Event>) {
        if report.is_empty() && report.filled_percent < self.finish_percent() {
            return;
        }

        let mut claimed: HashSet<CellCoord> = HashSet::new();
        for region in &report.regions {
            let points = region.size_in_cells() as u32 * POINTS_PER_CELL;
            self.score += points;
            for cell in &region.cells {
                let _ = claimed.insert(*cell);
            }
            out_events.push(Event::RegionClaimed {
                cells: region.cells.clone(),
                points,
            });
        }

        // Enemies caught inside any claimed region are removed from play.
        let mut index = 0;
        while index < self.enemies.len() {
            let inside = query::cell_at(&self.grid, self.enemies[index].position())
                .is_some_and(|cell| claimed.contains(&cell));
            if inside {
                let enemy = self.enemies.remove(index);
                self.score += ENEMY_ELIMINATION_POINTS;
                out_events.push(Event::EnemyEliminated {
                    id: enemy.id(),
                    position: enemy.position(),
                    points: ENEMY_ELIMINATION_POINTS,
                });
            } else {
                index += 1;
            }
        }

        // Power-ups caught inside a claimed region are destroyed for
        // points only; the effect is never applied on fill destruction.
        for index in 0..self.powerups.len() {
            let caught = self.powerups[index].is_active()
                && self.powerups[index]
                    .cell()
                    .is_some_and(|cell| claimed.contains(&cell));
            if !caught {
                continue;
            }
            let id = self.powerups[index].id();
            let kind = self.powerups[index].kind();
            let position = self.powerups[index]
                .cell()
                .map_or(self.player.position, |cell| {
                    query::cell_center(&self.grid, cell)
                });
            self.score += POWERUP_FILL_POINTS;
            self.lifecycle
                .consume(&mut self.powerups[index], now, &mut self.rng);
            out_events.push(Event::PowerUpCollected {
                id,
                kind,
                position,
                points: POWERUP_FILL_POINTS,
                by_fill: true,
            });
        }

        if report.filled_percent >= self.finish_percent() {
            self.complete_level(now, out_events);
        }
    }

    fn complete_level(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        let seconds_left = self.time_remaining.as_secs_f32().ceil() as u32;
        let bonus = COMPLETION_BASE_BONUS + COMPLETION_SECOND_BONUS * seconds_left;
        self.score += bonus;
        let _ = self.grid.force_claim_remaining();
        self.enemies.clear();
        self.phase = Phase::LevelComplete {
            advance_at: now + LEVEL_ADVANCE_DELAY,
        };
        out_events.push(Event::LevelComplete { bonus });
    }

    fn collect_overlapping_powerups(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        let Some(player_cell) = query::cell_at(&self.grid, self.player.position) else {
            return;
        };
        for index in 0..self.powerups.len() {
            let overlapping = self.powerups[index].is_active()
                && self.powerups[index].cell() == Some(player_cell);
            if !overlapping {
                continue;
            }
            let id = self.powerups[index].id();
            let kind = self.powerups[index].kind();
            let position = query::cell_center(&self.grid, player_cell);
            self.score += POWERUP_COLLECT_POINTS;
            self.lifecycle
                .consume(&mut self.powerups[index], now, &mut self.rng);
            self.apply_effect(kind, now);
            out_events.push(Event::PowerUpCollected {
                id,
                kind,
                position,
                points: POWERUP_COLLECT_POINTS,
                by_fill: false,
            });
        }
    }

    fn apply_effect(&mut self, kind: PowerUpKind, now: Duration) {
        match kind {
            PowerUpKind::ExtraLife => self.lives = (self.lives + 1).min(MAX_LIVES),
            PowerUpKind::ExtraTime => {
                self.time_remaining = self.time_remaining.saturating_add(EXTRA_TIME_BONUS);
            }
            PowerUpKind::ExtraSpeed => match &mut self.player.boost {
                // Stacked boosts extend the window; the factor never
                // compounds and the stored base restores exactly.
                Some(boost) => boost.until = now + SPEED_BOOST_DURATION,
                None => {
                    self.player.boost = Some(SpeedBoost {
                        until: now + SPEED_BOOST_DURATION,
                        base_speed: self.player.speed,
                    });
                    self.player.speed *= SPEED_BOOST_FACTOR;
                }
            },
            PowerUpKind::Freeze => {
                let until = now + FREEZE_DURATION;
                for enemy in &mut self.enemies {
                    enemy.freeze(now, until);
                }
            }
        }
    }

    fn lose_life(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        if !matches!(self.phase, Phase::Playing) {
            return;
        }

        self.lives = self.lives.saturating_sub(1);
        self.grid.discard_trail();
        self.player.position = spawn_point(&self.grid);
        self.player.facing = None;

        // The board reshuffles: fresh positions and headings everywhere,
        // discarding any freeze still in flight.
        for enemy in &mut self.enemies {
            enemy.thaw();
            if let Some(cell) = random_open_cell(&self.grid, &mut self.rng) {
                enemy.place(query::cell_center(&self.grid, cell));
            }
            enemy.roll_heading(&mut self.rng);
            enemy.schedule_redirect(now, &mut self.rng);
        }
        for instance in &mut self.powerups {
            self.lifecycle.reposition(instance, &self.grid, &mut self.rng);
        }

        out_events.push(Event::LifeLost);

        if self.lives == 0 {
            self.phase = Phase::GameOver;
            out_events.push(Event::GameOver {
                score: self.score,
                total_elapsed: self.total_elapsed,
            });
        } else {
            self.phase = Phase::LosingLife {
                resume_at: now + RESPAWN_DELAY,
            };
        }
    }

    fn finish_percent(&self) -> f32 {
        self.config.levels()[self.level_index].finish_percent()
    }
}

/// The fixed respawn point: bottom-center, inside the claimed margin.
fn spawn_point(grid: &Grid) -> Position {
    let margin_depth = query::margin(grid) as f32 * query::tile_length(grid);
    Position::new(
        query::width(grid) / 2.0,
        query::height(grid) - margin_depth / 2.0,
    )
}

fn random_open_cell(grid: &Grid, rng: &mut ChaCha8Rng) -> Option<CellCoord> {
    let open = query::empty_cells(grid);
    if open.is_empty() {
        return None;
    }
    Some(open[rng.gen_range(0..open.len())])
}

/// Derives the deterministic seed for one level of a session.
fn derive_level_seed(session_seed: u64, level_index: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN);
    hasher.update(session_seed.to_le_bytes());
    hasher.update((level_index as u64).to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::{derive_level_seed, spawn_point};
    use zone_capture_arena::Grid;

    #[test]
    fn level_seeds_differ_per_level_and_session() {
        assert_ne!(derive_level_seed(1, 0), derive_level_seed(1, 1));
        assert_ne!(derive_level_seed(1, 0), derive_level_seed(2, 0));
        assert_eq!(derive_level_seed(9, 3), derive_level_seed(9, 3));
    }

    #[test]
    fn spawn_point_sits_in_the_bottom_margin() {
        let grid = Grid::new(10, 10, 2, 10.0);
        let spawn = spawn_point(&grid);
        assert_eq!(spawn.x(), 50.0);
        assert_eq!(spawn.y(), 90.0);
    }
}
